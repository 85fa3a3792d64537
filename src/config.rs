//! Application-level configuration loading: round timing, question bank location and stream sizing.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_QUIZ_CONFIG_PATH";

const DEFAULT_TIME_LIMIT_SECS: u32 = 30;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
const DEFAULT_QUESTION_BANK_PATH: &str = "config/questions.json";
const DEFAULT_SPECTATOR_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_time_limit_secs: u32,
    tick_interval: Duration,
    question_bank_path: PathBuf,
    spectator_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        time_limit_secs = app_config.default_time_limit_secs,
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; absent fields keep their defaults.
    pub fn from_json_str(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Countdown used when a question carries no usable limit.
    pub fn default_time_limit_secs(&self) -> u32 {
        self.default_time_limit_secs
    }

    /// How often the countdown wakes up; rounds still last their full time limit.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn question_bank_path(&self) -> &PathBuf {
        &self.question_bank_path
    }

    pub fn spectator_capacity(&self) -> usize {
        self.spectator_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_time_limit_secs: u32,
    tick_interval_ms: u64,
    question_bank_path: PathBuf,
    spectator_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            question_bank_path: PathBuf::from(DEFAULT_QUESTION_BANK_PATH),
            spectator_capacity: DEFAULT_SPECTATOR_CAPACITY,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            default_time_limit_secs: if value.default_time_limit_secs == 0 {
                DEFAULT_TIME_LIMIT_SECS
            } else {
                value.default_time_limit_secs
            },
            tick_interval: Duration::from_millis(value.tick_interval_ms.max(1)),
            question_bank_path: value.question_bank_path,
            spectator_capacity: value.spectator_capacity.max(1),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.default_time_limit_secs(), 30);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(
            config.question_bank_path(),
            &PathBuf::from("config/questions.json")
        );
        assert_eq!(config.spectator_capacity(), 64);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let config = AppConfig::from_json_str(r#"{"default_time_limit_secs": 20}"#).unwrap();
        assert_eq!(config.default_time_limit_secs(), 20);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_time_limit_falls_back_to_default() {
        let config = AppConfig::from_json_str(r#"{"default_time_limit_secs": 0}"#).unwrap();
        assert_eq!(config.default_time_limit_secs(), 30);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json_str("{ not json").is_err());
    }
}
