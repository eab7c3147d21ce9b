//! Configuration file support for fitplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitplan/config.toml`.

use crate::progress::STREAK_WINDOW_DAYS;
use crate::timer::PRESETS_MINUTES;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the key-value store inside the data directory
pub const STORE_FILE: &str = "store.json";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub timer: TimerConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }
}

/// Calendar and streak settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_streak_window_days")]
    pub streak_window_days: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            streak_window_days: default_streak_window_days(),
        }
    }
}

/// Rest timer settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_presets_minutes")]
    pub presets_minutes: Vec<u32>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            presets_minutes: default_presets_minutes(),
        }
    }
}

// Default value functions
fn home_fallback(sub: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(sub)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| home_fallback(".local/share"))
        .join("fitplan")
}

fn default_streak_window_days() -> u32 {
    STREAK_WINDOW_DAYS
}

fn default_presets_minutes() -> Vec<u32> {
    PRESETS_MINUTES.to_vec()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| home_fallback(".config"))
            .join("fitplan")
            .join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.calendar.streak_window_days == 0 {
            return Err(Error::Config("calendar.streak_window_days must be positive".into()));
        }
        if self.timer.presets_minutes.contains(&0) {
            return Err(Error::Config("timer.presets_minutes must not contain 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.calendar.streak_window_days, 180);
        assert_eq!(config.timer.presets_minutes, vec![2, 3, 4, 5, 7, 10]);
        assert!(config.data.data_dir.ends_with("fitplan"));
        assert!(config.data.store_path().ends_with("fitplan/store.json"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.calendar.streak_window_days = 90;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.calendar.streak_window_days, 90);
        assert_eq!(loaded.timer.presets_minutes, config.timer.presets_minutes);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[timer]
presets_minutes = [1, 2]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timer.presets_minutes, vec![1, 2]);
        assert_eq!(config.calendar.streak_window_days, 180); // default
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[calendar]\nstreak_window_days = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[calendar\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Toml(_))));
    }
}
