//! Application-level configuration loading, including the game template catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::catalog::{GameTemplate, builtin_games},
    state::session::ADMIN_NAME,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";
const DEFAULT_TICK_INTERVAL_MS: u64 = 500;
const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SESSION_CODE_LENGTH: usize = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    tick_interval: Duration,
    handshake_timeout: Duration,
    session_code_length: usize,
    admin_name: String,
    games: Vec<GameTemplate>,
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
                        games = app_config.games.len(),
                        "loaded configuration"
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

    /// Parse a JSON configuration document. Missing keys take their default value.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Period of every session's broadcast tick.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// How long an admin socket may stay silent before sending its player id.
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    pub fn session_code_length(&self) -> usize {
        self.session_code_length
    }

    /// Display name given to the host player.
    pub fn admin_name(&self) -> &str {
        &self.admin_name
    }

    pub fn games(&self) -> &[GameTemplate] {
        &self.games
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS),
            session_code_length: DEFAULT_SESSION_CODE_LENGTH,
            admin_name: ADMIN_NAME.into(),
            games: builtin_games(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    tick_interval_ms: Option<u64>,
    handshake_timeout_ms: Option<u64>,
    session_code_length: Option<usize>,
    admin_name: Option<String>,
    games: Option<Vec<GameTemplate>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: value
                .tick_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            handshake_timeout: value
                .handshake_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.handshake_timeout),
            session_code_length: value
                .session_code_length
                .filter(|length| *length > 0)
                .unwrap_or(defaults.session_code_length),
            admin_name: value
                .admin_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.admin_name),
            games: value
                .games
                .map(valid_games)
                .unwrap_or(defaults.games),
        }
    }
}

/// Keep only the templates that pass validation.
fn valid_games(games: Vec<GameTemplate>) -> Vec<GameTemplate> {
    games
        .into_iter()
        .filter(|game| match game.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(game_id = game.id, error = %err, "dropping invalid game template");
                false
            }
        })
        .collect()
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
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.session_code_length(), 3);
        assert_eq!(config.admin_name(), "admin");
        assert_eq!(config.games(), builtin_games().as_slice());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_json_str(
            r#"{ "tick_interval_ms": 250, "session_code_length": 5, "admin_name": "host" }"#,
        )
        .unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.session_code_length(), 5);
        assert_eq!(config.admin_name(), "host");
    }

    #[test]
    fn zero_tick_interval_falls_back_to_default() {
        let config = AppConfig::from_json_str(r#"{ "tick_interval_ms": 0 }"#).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn invalid_templates_are_dropped() {
        let config = AppConfig::from_json_str(
            r#"{
                "games": [
                    {
                        "id": 1,
                        "name": "Capitals",
                        "questions": [{
                            "id": 1,
                            "text": "Capital of France?",
                            "correctAnswerId": 2,
                            "answers": [{ "id": 1, "text": "Lyon" }, { "id": 2, "text": "Paris" }]
                        }]
                    },
                    {
                        "id": 2,
                        "name": "Broken",
                        "questions": [{
                            "id": 1,
                            "text": "?",
                            "correctAnswerId": 9,
                            "answers": [{ "id": 1, "text": "A" }]
                        }]
                    }
                ]
            }"#,
        )
        .unwrap();

        let ids: Vec<u32> = config.games().iter().map(|game| game.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json_str("{ not json").is_err());
    }
}
