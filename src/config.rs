//! Database configuration.
//!
//! Read from `datarepo.toml`, then overridden by `DB_*` environment variables
//! (a `.env` file is loaded first when present).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "datarepo.toml";

pub const ENV_PATH: &str = "DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "DB_BUSY_TIMEOUT_MS";
pub const ENV_FOREIGN_KEYS: &str = "DB_FOREIGN_KEYS";

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file; `:memory:` opens a fresh database per connection
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("datarepo.db")
}

const fn default_foreign_keys() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: None,
            foreign_keys: default_foreign_keys(),
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// `datarepo.toml` in the working directory when it exists, defaults
    /// otherwise; then `.env` and the process environment on top.
    pub fn load() -> Result<Self, Error> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::load_from(path)?
        } else {
            Self::default()
        };
        let _ = dotenvy::dotenv();
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Load from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.into())
            } else {
                Error::Io(path.into(), e)
            }
        })?;
        toml::from_str(&content).map_err(|e| Error::Parse(path.into(), e))
    }

    /// Defaults overridden by the process environment only.
    pub fn from_env() -> Result<Self, Error> {
        let _ = dotenvy::dotenv();
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `DB_PATH`, `DB_BUSY_TIMEOUT_MS` and `DB_FOREIGN_KEYS` as
    /// returned by `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        if let Some(path) = lookup(ENV_PATH) {
            self.path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|_| Error::InvalidEnv {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
            })?;
            self.busy_timeout_ms = Some(ms);
        }
        if let Some(raw) = lookup(ENV_FOREIGN_KEYS) {
            self.foreign_keys = parse_flag(&raw).ok_or_else(|| Error::InvalidEnv {
                key: ENV_FOREIGN_KEYS,
                value: raw.clone(),
            })?;
        }
        Ok(self)
    }

    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

pub type ConfigError = Error;
