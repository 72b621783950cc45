// Credentials and poll settings from flat files with environment overrides

use std::path::Path;

use thiserror::Error;

/// Credentials file: line 1 API key, line 2 API hash.
pub const TOKENS_FILE: &str = "tokens.txt";
/// Settings file: line 1 poll enable flag, line 2 poll interval in minutes.
pub const SETTINGS_FILE: &str = "settings.txt";

pub const ENV_KEY: &str = "RACKNERD_KEY";
pub const ENV_HASH: &str = "RACKNERD_HASH";
pub const ENV_POLL: &str = "RACKNERD_POLL";
pub const ENV_POLL_INTERVAL: &str = "RACKNERD_POLL_INTERVAL";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Fatal startup error: a required value is missing from both the environment
/// and its file, or malformed. The process exits before serving traffic.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} not set: provide {env} or line {line} of {file}")]
    Missing {
        name: &'static str,
        env: &'static str,
        file: &'static str,
        line: usize,
    },
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub key: String,
    pub hash: String,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub poll: PollConfig,
}

/// Raw optional inputs for resolution: environment values and file contents.
/// Resolution over these is pure, so tests never touch the process environment.
#[derive(Debug, Default)]
pub struct ConfigSources {
    pub env_key: Option<String>,
    pub env_hash: Option<String>,
    pub env_poll: Option<String>,
    pub env_poll_interval: Option<String>,
    pub tokens_file: Option<String>,
    pub settings_file: Option<String>,
}

impl ConfigSources {
    /// Reads the process environment and the given files. A missing file is an
    /// absent source, not an error; resolution decides what is fatal.
    pub fn gather(tokens_path: &Path, settings_path: &Path) -> Self {
        Self {
            env_key: std::env::var(ENV_KEY).ok(),
            env_hash: std::env::var(ENV_HASH).ok(),
            env_poll: std::env::var(ENV_POLL).ok(),
            env_poll_interval: std::env::var(ENV_POLL_INTERVAL).ok(),
            tokens_file: std::fs::read_to_string(tokens_path).ok(),
            settings_file: std::fs::read_to_string(settings_path).ok(),
        }
    }
}

impl AppConfig {
    /// Load from `tokens.txt` / `settings.txt` in the working directory, with
    /// environment overrides. Called once at startup; read-only thereafter.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(TOKENS_FILE), Path::new(SETTINGS_FILE))
    }

    pub fn load_from(tokens_path: &Path, settings_path: &Path) -> Result<Self, ConfigError> {
        Self::resolve(ConfigSources::gather(tokens_path, settings_path))
    }

    /// Environment wins over file, per value; a value found in neither source
    /// is a `ConfigError`.
    pub fn resolve(sources: ConfigSources) -> Result<Self, ConfigError> {
        let key = resolve_value(
            sources.env_key,
            sources.tokens_file.as_deref(),
            Slot {
                name: "api key",
                env: ENV_KEY,
                file: TOKENS_FILE,
                line: 1,
            },
        )?;
        let hash = resolve_value(
            sources.env_hash,
            sources.tokens_file.as_deref(),
            Slot {
                name: "api hash",
                env: ENV_HASH,
                file: TOKENS_FILE,
                line: 2,
            },
        )?;
        let enabled_raw = resolve_value(
            sources.env_poll,
            sources.settings_file.as_deref(),
            Slot {
                name: "poll flag",
                env: ENV_POLL,
                file: SETTINGS_FILE,
                line: 1,
            },
        )?;
        let interval_raw = resolve_value(
            sources.env_poll_interval,
            sources.settings_file.as_deref(),
            Slot {
                name: "poll interval",
                env: ENV_POLL_INTERVAL,
                file: SETTINGS_FILE,
                line: 2,
            },
        )?;

        let enabled = parse_bool_like(&enabled_raw);
        let interval_minutes: u64 = interval_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "poll interval",
            value: interval_raw.clone(),
            reason: "expected a whole number of minutes",
        })?;
        if enabled && interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                name: "poll interval",
                value: interval_raw,
                reason: "must be at least 1 minute when polling is enabled",
            });
        }

        Ok(Self {
            credentials: Credentials { key, hash },
            poll: PollConfig {
                enabled,
                interval_minutes,
            },
        })
    }
}

/// Where a value lives: its env var and its 1-based line in a config file.
struct Slot {
    name: &'static str,
    env: &'static str,
    file: &'static str,
    line: usize,
}

fn resolve_value(
    env: Option<String>,
    file: Option<&str>,
    slot: Slot,
) -> Result<String, ConfigError> {
    if let Some(v) = env
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    {
        return Ok(v);
    }
    file_line(file, slot.line).ok_or(ConfigError::Missing {
        name: slot.name,
        env: slot.env,
        file: slot.file,
        line: slot.line,
    })
}

fn file_line(contents: Option<&str>, line: usize) -> Option<String> {
    contents?
        .lines()
        .nth(line - 1)
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// The settings file traditionally holds `True` / `False`; accept the common
/// truthy spellings and treat everything else as disabled.
pub fn parse_bool_like(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
