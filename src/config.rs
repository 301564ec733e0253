//! Application-level configuration loading, including the validated session parameters.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RALLY_ROUNDS_CONFIG_PATH";

const DEFAULT_MAX_PLAYERS: u32 = 8;
const DEFAULT_MAX_ROUNDS: u32 = 4;
const DEFAULT_ROUND_MINUTES: u32 = 25;
const DEFAULT_BREAK_MINUTES: u32 = 5;
const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Raised when session parameters fall outside their allowed ranges.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// At least one field failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationErrors),
}

/// Validated parameters a session is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct SessionConfig {
    #[validate(range(min = 1, max = 32))]
    max_players: u32,
    #[validate(range(min = 1, max = 24))]
    max_rounds: u32,
    #[validate(range(min = 1, max = 120))]
    round_minutes: u32,
    #[validate(range(min = 1, max = 60))]
    break_minutes: u32,
}

impl SessionConfig {
    /// Build a configuration, rejecting zero or out-of-range values.
    pub fn new(
        max_players: u32,
        max_rounds: u32,
        round_minutes: u32,
        break_minutes: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_players,
            max_rounds,
            round_minutes,
            break_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Most participants a session accepts.
    pub fn max_players(&self) -> u32 {
        self.max_players
    }

    /// Rounds played before game-over.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Length of a work phase in minutes.
    pub fn round_minutes(&self) -> u32 {
        self.round_minutes
    }

    /// Length of a break in minutes.
    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    /// Work phase length in timer units (seconds).
    pub fn round_seconds(&self) -> u32 {
        self.round_minutes * 60
    }

    /// Break length in timer units (seconds).
    pub fn break_seconds(&self) -> u32 {
        self.break_minutes * 60
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_minutes: DEFAULT_ROUND_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    session: SessionConfig,
    sync_interval: Duration,
    tick_interval: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => match Self::try_from(raw) {
                    Ok(app_config) => {
                        info!(
                            path = %path.display(),
                            max_players = app_config.session.max_players(),
                            max_rounds = app_config.session.max_rounds(),
                            "loaded session configuration"
                        );
                        app_config
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "config rejected; falling back to defaults"
                        );
                        Self::default()
                    }
                },
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

    /// Parameters for newly created sessions.
    pub fn session(&self) -> SessionConfig {
        self.session
    }

    /// Period of the sync cycle.
    pub fn sync_interval(&self) -> Duration {
        self.sync_interval
    }

    /// Period of the phase tick (one timer unit).
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    session: RawSessionConfig,
    sync_interval_secs: Option<u64>,
    tick_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
/// Session section of the configuration file; absent fields take the defaults.
struct RawSessionConfig {
    max_players: Option<u32>,
    max_rounds: Option<u32>,
    round_minutes: Option<u32>,
    break_minutes: Option<u32>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let raw = value.session;
        let session = SessionConfig::new(
            raw.max_players.unwrap_or(DEFAULT_MAX_PLAYERS),
            raw.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS),
            raw.round_minutes.unwrap_or(DEFAULT_ROUND_MINUTES),
            raw.break_minutes.unwrap_or(DEFAULT_BREAK_MINUTES),
        )?;

        Ok(Self {
            session,
            sync_interval: value
                .sync_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SYNC_INTERVAL),
            tick_interval: value
                .tick_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
