use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::Path;
use uuid::Uuid;

use crate::api_key::get_api_key;
use crate::audio::{AudioClip, CaptureSession, Microphone};
use crate::capture::{ANALYZING_STEP, InputCapture};
use crate::cli::Config;
use crate::error::OrganizerError;
use crate::gateway::ModelGateway;
use crate::logging::{log_error, log_info, log_warn, setup_session_file_logging};
use crate::model::sample_tasks;
use crate::output::{render_plan, render_task_list};
use crate::planner::{PLANNING_STEP, regenerate_plan};
use crate::state::{Action, OrganizerState};
use crate::theme::{Theme, ThemeStore};

pub async fn run_app(config: Config) -> Result<()> {
    let session_id = Uuid::new_v4().to_string();
    setup_session_file_logging(&session_id).context("Failed to setup session file logging")?;
    log_info(&format!("Starting session {session_id}"));

    let theme_store = ThemeStore::default_location()?;
    let theme = match config.theme {
        Some(theme) => {
            if let Err(e) = theme_store.save(theme) {
                log_warn(&format!("Could not save theme: {e:#}"));
            }
            theme
        }
        None => theme_store.load(),
    };

    let state = if config.no_samples {
        OrganizerState::default()
    } else {
        OrganizerState::with_tasks(sample_tasks(Utc::now()))
    };

    if config.is_one_shot() {
        run_one_shot(&config, state, theme).await
    } else {
        Session::new(config, state, theme_store, theme).run().await
    }
}

fn connect_gateway(config: &Config) -> Result<ModelGateway> {
    let api_key = get_api_key().context("Failed to get API key")?;
    ModelGateway::connect(
        &config.extract_model,
        &config.plan_model,
        api_key,
        config.thinking_budget,
    )
}

/// Turn a flow error into an `anyhow` chain whose top line is the user notice
fn flow_failure(e: OrganizerError) -> anyhow::Error {
    let notice = e.user_message();
    anyhow::Error::new(e).context(notice)
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .context("Input thread failed")?
    .context("Failed to read from stdin")
}

async fn record_until_enter() -> Result<AudioClip> {
    let mut recorder = CaptureSession::new(Microphone::default());
    recorder.start().map_err(flow_failure)?;

    eprintln!("🎙️  Recording... press Enter to stop.");
    wait_for_enter().await?;

    recorder
        .stop()
        .map_err(flow_failure)?
        .context("No audio recorded")
}

async fn run_one_shot(config: &Config, mut state: OrganizerState, theme: Theme) -> Result<()> {
    let gateway = connect_gateway(config)?;

    let mut capture = InputCapture::new();
    capture.set_text(config.prompt.clone());
    if let Some(path) = &config.image {
        capture.attach_image(path)?;
    }
    let audio = if config.record_audio {
        Some(record_until_enter().await?)
    } else {
        None
    };

    eprintln!("{}", ANALYZING_STEP.dimmed());
    let added = capture
        .submit(&gateway, &mut state, audio)
        .await
        .map_err(flow_failure)?;

    println!("Added {added} task(s).");
    print!("{}", render_task_list(state.tasks.tasks(), theme)?);

    if config.plan {
        eprintln!("{}", PLANNING_STEP.dimmed());
        match regenerate_plan(&gateway, &mut state).await {
            Ok(()) => {
                if let Some(plan) = &state.plan {
                    println!();
                    print!("{}", render_plan(plan, state.tasks.tasks(), theme));
                }
            }
            Err(OrganizerError::NoActiveTasks) => {
                println!("{}", OrganizerError::NoActiveTasks.user_message().yellow());
            }
            Err(e) => return Err(flow_failure(e)),
        }
    }
    Ok(())
}

enum SlashResult {
    Continue,
    Quit,
}

/// Interactive session over one in-memory task list
struct Session {
    config: Config,
    state: OrganizerState,
    capture: InputCapture,
    recorder: CaptureSession<Microphone>,
    gateway: Option<ModelGateway>,
    theme_store: ThemeStore,
    theme: Theme,
}

impl Session {
    fn new(config: Config, state: OrganizerState, theme_store: ThemeStore, theme: Theme) -> Self {
        Self {
            config,
            state,
            capture: InputCapture::new(),
            recorder: CaptureSession::new(Microphone::default()),
            gateway: None,
            theme_store,
            theme,
        }
    }

    async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        self.print_tasks();

        let mut rl =
            DefaultEditor::new().map_err(|e| anyhow::anyhow!("Failed to initialize readline: {e}"))?;

        loop {
            let prompt = if self.recorder.is_recording() {
                format!("{} ", "●".red())
            } else {
                format!("{} ", ">".bright_green())
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.capture.set_text(input);
                        self.submit(None).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(anyhow::anyhow!("Readline error: {err}"));
                }
            }
        }

        // release the microphone if the session ends mid-recording
        let _ = self.recorder.stop();
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "LifeOrganizer".bright_cyan().bold());
        println!(
            "Describe what you need to do and Gemini turns it into tasks. Type {} for help, {} to quit",
            "/help".yellow(),
            "/quit".yellow()
        );
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:18} Extract tasks from the text", "<text>".yellow());
        println!("  {:18} Attach an image to the next submission", "/image <path>".yellow());
        println!("  {:18} Remove the attached image", "/clear-image".yellow());
        println!("  {:18} Start recording a voice note", "/record".yellow());
        println!("  {:18} Stop recording and submit it", "/stop".yellow());
        println!("  {:18} Show the task list", "/list".yellow());
        println!("  {:18} Toggle task n complete", "/done <n>".yellow());
        println!("  {:18} Delete task n", "/delete <n>".yellow());
        println!("  {:18} Generate a day plan from active tasks", "/plan".yellow());
        println!("  {:18} Show the current day plan", "/show-plan".yellow());
        println!("  {:18} Toggle or set the color theme", "/theme [dark|light]".yellow());
        println!("  {:18} Hide the current error", "/dismiss".yellow());
        println!("  {:18} Show models, counts, and staged input", "/status".yellow());
        println!("  {:18} Show this help", "/help".yellow());
        println!("  {:18} Exit", "/quit".yellow());
        println!();
    }

    fn print_tasks(&self) {
        match render_task_list(self.state.tasks.tasks(), self.theme) {
            Ok(table) => print!("{table}"),
            Err(e) => log_error(&format!("Failed to render tasks: {e:#}")),
        }
    }

    fn print_error(&self) {
        if let Some(error) = &self.state.error {
            println!("{} {}", "✗".red(), error.red());
            println!("{}", "  (/dismiss to hide)".dimmed());
        }
    }

    fn ensure_gateway(&mut self) -> Result<()> {
        if self.gateway.is_none() {
            self.gateway = Some(connect_gateway(&self.config)?);
        }
        Ok(())
    }

    async fn submit(&mut self, audio: Option<AudioClip>) {
        if self.capture.is_empty() && audio.is_none() {
            return;
        }

        if let Err(e) = self.ensure_gateway() {
            log_error(&format!("Model unavailable: {e:#}"));
            let failure = OrganizerError::AnalysisFailed(format!("{e:#}"));
            self.state.apply(Action::Failed(failure.user_message().to_string()));
            println!("{}", format!("{e:#}").dimmed());
            self.print_error();
            return;
        }
        let Some(gateway) = self.gateway.as_ref() else {
            return;
        };

        println!("{}", ANALYZING_STEP.dimmed());
        match self.capture.submit(gateway, &mut self.state, audio).await {
            Ok(added) => {
                println!("{}", format!("Added {added} task(s).").green());
                self.print_tasks();
            }
            Err(OrganizerError::InvalidInput) => {}
            Err(_) => self.print_error(),
        }
    }

    async fn plan(&mut self) {
        if self.state.tasks.active_count() == 0 {
            println!("{}", OrganizerError::NoActiveTasks.user_message().yellow());
            return;
        }

        if let Err(e) = self.ensure_gateway() {
            log_error(&format!("Model unavailable: {e:#}"));
            let failure = OrganizerError::PlanFailed(format!("{e:#}"));
            self.state.apply(Action::Failed(failure.user_message().to_string()));
            println!("{}", format!("{e:#}").dimmed());
            self.print_error();
            return;
        }
        let Some(gateway) = self.gateway.as_ref() else {
            return;
        };

        println!("{}", PLANNING_STEP.dimmed());
        match regenerate_plan(gateway, &mut self.state).await {
            Ok(()) => self.print_plan(),
            Err(OrganizerError::NoActiveTasks) => {
                println!("{}", OrganizerError::NoActiveTasks.user_message().yellow());
            }
            Err(_) => self.print_error(),
        }
    }

    fn print_plan(&self) {
        match &self.state.plan {
            Some(plan) => print!("{}", render_plan(plan, self.state.tasks.tasks(), self.theme)),
            None => println!(
                "{}",
                format!("No plan yet. Type {} to generate one.", "/plan").dimmed()
            ),
        }
    }

    fn print_status(&self) {
        println!("Extraction model: {}", self.config.extract_model);
        println!(
            "Planning model:   {} (thinking budget {})",
            self.config.plan_model, self.config.thinking_budget
        );
        println!(
            "Tasks:            {} active, {} completed",
            self.state.tasks.active_count(),
            self.state.tasks.completed_count()
        );
        if let Some(image) = self.capture.image() {
            println!(
                "Staged image:     {} ({} KB)",
                image.source().unwrap_or("attached"),
                image.len() / 1024
            );
        }
        if !self.capture.text().trim().is_empty() {
            println!("Staged text:      {}", self.capture.text());
        }
        println!("Recording:        {:?}", self.recorder.state());
        println!("Theme:            {}", self.theme);
        self.print_error();
    }

    /// Resolve `/done 2` style arguments against the displayed numbering
    fn task_at(&self, arg: Option<&str>) -> Option<uuid::Uuid> {
        let position = arg?.parse::<usize>().ok()?;
        self.state.tasks.id_at(position)
    }

    fn set_theme(&mut self, requested: Option<&str>) {
        let saved = match requested {
            None => self.theme_store.toggle(self.theme),
            Some(name) => match name.parse::<Theme>() {
                Ok(theme) => self.theme_store.save(theme).map(|()| theme),
                Err(e) => {
                    println!("{} {e}", "?".yellow());
                    return;
                }
            },
        };
        let next = match saved {
            Ok(theme) => theme,
            Err(e) => {
                log_warn(&format!("Could not save theme: {e:#}"));
                requested
                    .and_then(|name| name.parse().ok())
                    .unwrap_or_else(|| self.theme.toggled())
            }
        };
        self.theme = next;
        println!("Theme: {next}");
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let (cmd, arg) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (input, None),
        };

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return SlashResult::Quit,
            "/list" | "/l" => self.print_tasks(),
            "/image" => match arg {
                Some(path) => match self.capture.attach_image(Path::new(path)) {
                    Ok(image) => println!(
                        "{}",
                        format!(
                            "Image attached ({} KB). It is sent with your next message.",
                            image.len() / 1024
                        )
                        .green()
                    ),
                    Err(e) => println!("{} {e:#}", "✗".red()),
                },
                None => println!("Usage: {} <path>", "/image".yellow()),
            },
            "/clear-image" => {
                if self.capture.clear_image() {
                    println!("{}", "Image removed.".dimmed());
                } else {
                    println!("{}", "No image attached.".dimmed());
                }
            }
            "/record" => match self.recorder.start() {
                Ok(true) => println!(
                    "{}",
                    format!("Recording... type {} to finish.", "/stop").red()
                ),
                Ok(false) => println!("{}", "Already recording.".dimmed()),
                Err(e) => {
                    log_error(&format!("{e}"));
                    self.state.apply(Action::Failed(e.user_message().to_string()));
                    self.print_error();
                }
            },
            "/stop" => match self.recorder.stop() {
                Ok(Some(clip)) => {
                    log_info(&format!("Submitting {} bytes of audio", clip.len()));
                    self.submit(Some(clip)).await;
                }
                Ok(None) => println!("{}", "Not recording.".dimmed()),
                Err(e) => {
                    log_error(&format!("{e}"));
                    self.state.apply(Action::Failed(e.user_message().to_string()));
                    self.print_error();
                }
            },
            "/done" => match self.task_at(arg) {
                Some(id) => {
                    self.state.apply(Action::ToggleComplete(id));
                    self.print_tasks();
                }
                None => println!("{} No task #{}", "?".yellow(), arg.unwrap_or("")),
            },
            "/delete" => match self.task_at(arg) {
                Some(id) => {
                    self.state.apply(Action::DeleteTask(id));
                    self.print_tasks();
                }
                None => println!("{} No task #{}", "?".yellow(), arg.unwrap_or("")),
            },
            "/plan" => self.plan().await,
            "/show-plan" => self.print_plan(),
            "/theme" => self.set_theme(arg),
            "/dismiss" => self.state.apply(Action::DismissError),
            "/status" => self.print_status(),
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }
}
