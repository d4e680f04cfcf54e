use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{APP_DIR_NAME, SETTINGS_FILE_NAME, THEME_KEY};
use crate::logging::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Guess from `COLORFGBG` ("fg;bg"), where backgrounds 7 and 15 are light
    pub fn from_colorfgbg(value: &str) -> Option<Self> {
        let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(match background {
            7 | 15 => Theme::Light,
            _ => Theme::Dark,
        })
    }

    pub fn detect_terminal() -> Option<Self> {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| Self::from_colorfgbg(&value))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow::anyhow!(
                "Unknown theme '{other}'. Use 'dark' or 'light'"
            )),
        }
    }
}

/// The settings file holding the theme preference
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `~/.lifeorg/settings.json`
    pub fn default_location() -> Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(Self::new(
            home_dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME),
        ))
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_settings(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings: {}", self.path.display()))?;
        serde_json::from_str(&content).context("Failed to parse settings")
    }

    /// Stored preference, if any
    pub fn stored(&self) -> Option<Theme> {
        let settings = match self.read_settings() {
            Ok(settings) => settings,
            Err(e) => {
                log_warn(&format!("Ignoring unreadable settings: {e:#}"));
                return None;
            }
        };
        settings
            .get(THEME_KEY)
            .and_then(Value::as_str)
            .and_then(|value| value.parse().ok())
    }

    /// Stored preference, else the terminal's light/dark signal, else light
    pub fn load(&self) -> Theme {
        if let Some(theme) = self.stored() {
            log_debug(&format!("Theme from settings: {theme}"));
            return theme;
        }
        let theme = Theme::detect_terminal().unwrap_or_default();
        log_debug(&format!("Theme from terminal: {theme}"));
        theme
    }

    /// Write the preference, keeping any other keys in the file
    pub fn save(&self, theme: Theme) -> Result<()> {
        let mut settings = self.read_settings().unwrap_or_default();
        settings.insert(THEME_KEY.to_string(), Value::from(theme.as_str()));

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(&settings).context("Failed to serialize settings")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings: {}", self.path.display()))?;

        log_info(&format!("Saved theme '{theme}' to {}", self.path.display()));
        Ok(())
    }

    pub fn toggle(&self, current: Theme) -> Result<Theme> {
        let next = current.toggled();
        self.save(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ThemeStore {
        ThemeStore::new(dir.path().join(".lifeorg").join("settings.json"))
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" light ".parse::<Theme>().unwrap(), Theme::Light);
        assert!("solarized".parse::<Theme>().is_err());
    }

    #[test]
    fn test_colorfgbg() {
        assert_eq!(Theme::from_colorfgbg("15;0"), Some(Theme::Dark));
        assert_eq!(Theme::from_colorfgbg("0;15"), Some(Theme::Light));
        assert_eq!(Theme::from_colorfgbg("0;default;7"), Some(Theme::Light));
        assert_eq!(Theme::from_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        store.save(Theme::Dark)?;
        assert_eq!(store.stored(), Some(Theme::Dark));

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path())?)?;
        assert_eq!(raw["theme"], "dark");
        Ok(())
    }

    #[test]
    fn test_toggle_persists() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        assert_eq!(store.toggle(Theme::Light)?, Theme::Dark);
        assert_eq!(store.toggle(Theme::Dark)?, Theme::Light);
        assert_eq!(store.stored(), Some(Theme::Light));
        Ok(())
    }

    #[test]
    fn test_save_keeps_other_keys() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap())?;
        fs::write(store.path(), r#"{"other":1,"theme":"light"}"#)?;

        store.save(Theme::Dark)?;

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path())?)?;
        assert_eq!(raw["other"], 1);
        assert_eq!(raw["theme"], "dark");
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_falls_back_to_terminal() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        unsafe {
            std::env::set_var("COLORFGBG", "15;0");
        }
        assert_eq!(store.load(), Theme::Dark);

        unsafe {
            std::env::remove_var("COLORFGBG");
        }
        assert_eq!(store.load(), Theme::Light);

        store.save(Theme::Dark)?;
        assert_eq!(store.load(), Theme::Dark);
        Ok(())
    }

    #[test]
    fn test_corrupt_settings_are_ignored() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap())?;
        fs::write(store.path(), "not json")?;

        assert_eq!(store.stored(), None);
        store.save(Theme::Light)?;
        assert_eq!(store.stored(), Some(Theme::Light));
        Ok(())
    }
}
