use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

use crate::constants::{get_default_extract_model, get_default_plan_model, get_thinking_budget};
use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub image: Option<PathBuf>,
    pub record_audio: bool,
    pub plan: bool,
    pub theme: Option<Theme>, // None = settings file or terminal
    pub no_samples: bool,
    pub extract_model: String,
    pub plan_model: String,
    pub thinking_budget: u32,
}

impl Config {
    pub fn from_args() -> Self {
        Self::from_matches(&Self::build_cli().get_matches())
    }

    /// One-shot mode runs when there is something to extract
    pub fn is_one_shot(&self) -> bool {
        !self.prompt.trim().is_empty() || self.image.is_some() || self.record_audio
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let prompt_parts: Vec<String> = matches
            .get_many::<String>("prompt")
            .unwrap_or_default()
            .cloned()
            .collect();

        Self {
            prompt: prompt_parts.join(" "),
            image: matches.get_one::<String>("image").map(PathBuf::from),
            record_audio: matches.get_flag("record-audio"),
            plan: matches.get_flag("plan"),
            theme: matches
                .get_one::<String>("theme")
                .and_then(|t| t.parse().ok()),
            no_samples: matches.get_flag("no-samples"),
            extract_model: matches
                .get_one::<String>("extract-model")
                .cloned()
                .unwrap_or_else(get_default_extract_model),
            plan_model: matches
                .get_one::<String>("plan-model")
                .cloned()
                .unwrap_or_else(get_default_plan_model),
            thinking_budget: matches
                .get_one::<u32>("thinking-budget")
                .copied()
                .unwrap_or_else(get_thinking_budget),
        }
    }

    fn build_cli() -> Command {
        Command::new("lifeorg")
            .version(env!("LIFEORG_VERSION"))
            .about("Personal task organizer using Google Gemini API")
            .after_help(
                "Without a prompt, image, or recording, starts an interactive session.\n\
                 Type /help inside the session for its commands.",
            )
            .next_help_heading("Input Options")
            .arg(
                Arg::new("prompt")
                    .help("Describe what you need to do; tasks are extracted from it")
                    .num_args(0..)
                    .required(false),
            )
            .arg(
                Arg::new("image")
                    .short('i')
                    .long("image")
                    .help("Extract tasks from an image (jpg, png, webp, gif, bmp, tiff)")
                    .value_name("FILE")
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("record-audio")
                    .short('a')
                    .long("record-audio")
                    .help("Record a voice note from the default microphone; press Enter to stop")
                    .action(clap::ArgAction::SetTrue),
            )
            .next_help_heading("Output Options")
            .arg(
                Arg::new("plan")
                    .short('p')
                    .long("plan")
                    .help("Generate a day plan from the active tasks after extraction")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("theme")
                    .short('t')
                    .long("theme")
                    .help("Color theme; saved to ~/.lifeorg/settings.json")
                    .value_name("THEME")
                    .value_parser(["dark", "light"])
                    .action(clap::ArgAction::Set),
            )
            .next_help_heading("Other Options")
            .arg(
                Arg::new("no-samples")
                    .long("no-samples")
                    .help("Start with an empty task list instead of the sample tasks")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("extract-model")
                    .long("extract-model")
                    .help("Model for task extraction. Can be set via LIFEORG_EXTRACT_MODEL environment variable.")
                    .value_name("MODEL")
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("plan-model")
                    .long("plan-model")
                    .help("Model for day planning. Can be set via LIFEORG_PLAN_MODEL environment variable.")
                    .value_name("MODEL")
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("thinking-budget")
                    .long("thinking-budget")
                    .help("Thinking token budget for planning. Can be set via LIFEORG_THINKING_BUDGET environment variable.")
                    .value_name("TOKENS")
                    .value_parser(clap::value_parser!(u32))
                    .action(clap::ArgAction::Set),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_EXTRACT_MODEL, DEFAULT_PLAN_MODEL, DEFAULT_THINKING_BUDGET};
    use serial_test::serial;
    use std::env;

    impl Config {
        fn from_args_with_test(args: &[&str]) -> Self {
            let matches = Self::build_cli()
                .try_get_matches_from(std::iter::once("lifeorg").chain(args.iter().copied()))
                .unwrap();
            Self::from_matches(&matches)
        }
    }

    fn clear_env() {
        unsafe {
            env::remove_var("LIFEORG_EXTRACT_MODEL");
            env::remove_var("LIFEORG_PLAN_MODEL");
            env::remove_var("LIFEORG_THINKING_BUDGET");
        }
    }

    #[test]
    #[serial]
    fn test_defaults_start_interactive_session() {
        clear_env();
        let config = Config::from_args_with_test(&[]);

        assert!(!config.is_one_shot());
        assert_eq!(config.extract_model, DEFAULT_EXTRACT_MODEL);
        assert_eq!(config.plan_model, DEFAULT_PLAN_MODEL);
        assert_eq!(config.thinking_budget, DEFAULT_THINKING_BUDGET);
        assert!(config.theme.is_none());
    }

    #[test]
    fn test_prompt_words_are_joined() {
        let config = Config::from_args_with_test(&["Book", "dentist", "for", "Tuesday", "-p"]);
        assert_eq!(config.prompt, "Book dentist for Tuesday");
        assert!(config.plan);
        assert!(config.is_one_shot());
    }

    #[test]
    fn test_image_and_audio_are_one_shot() {
        assert!(Config::from_args_with_test(&["-i", "photo.png"]).is_one_shot());
        assert!(Config::from_args_with_test(&["-a"]).is_one_shot());
    }

    #[test]
    #[serial]
    fn test_env_and_flag_precedence() {
        clear_env();
        unsafe {
            env::set_var("LIFEORG_PLAN_MODEL", "gemini-2.5-pro");
            env::set_var("LIFEORG_THINKING_BUDGET", "512");
        }

        let config = Config::from_args_with_test(&[]);
        assert_eq!(config.plan_model, "gemini-2.5-pro");
        assert_eq!(config.thinking_budget, 512);

        let config =
            Config::from_args_with_test(&["--plan-model", "gemini-2.0-flash", "--thinking-budget", "0"]);
        assert_eq!(config.plan_model, "gemini-2.0-flash");
        assert_eq!(config.thinking_budget, 0);

        clear_env();
    }

    #[test]
    fn test_theme_flag() {
        let config = Config::from_args_with_test(&["--theme", "dark"]);
        assert_eq!(config.theme, Some(Theme::Dark));

        assert!(
            Config::build_cli()
                .try_get_matches_from(["lifeorg", "--theme", "blue"])
                .is_err()
        );
    }
}
