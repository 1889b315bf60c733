use std::env;
use std::fmt;
use std::path::PathBuf;

use audit_fee_core::wizard::{StateStore, DEFAULT_STATE_KEY};

/// Top-level configuration for the command line front end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let state_dir =
            env::var("AUDIT_FEE_STATE_DIR").unwrap_or_else(|_| ".audit-fee".to_string());
        if state_dir.trim().is_empty() {
            return Err(ConfigError::EmptyStateDir);
        }

        let state_key =
            env::var("AUDIT_FEE_STATE_KEY").unwrap_or_else(|_| DEFAULT_STATE_KEY.to_string());
        if !is_valid_key(&state_key) {
            return Err(ConfigError::InvalidStateKey(state_key));
        }

        let log_level = env::var("AUDIT_FEE_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

        Ok(Self {
            storage: StorageConfig {
                state_dir: PathBuf::from(state_dir),
                state_key,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the wizard state lives between invocations.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
    pub state_key: String,
}

impl StorageConfig {
    pub fn store(&self) -> StateStore {
        StateStore::with_key(&self.state_dir, &self.state_key)
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

// The key becomes a file name inside the state directory.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.')
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyStateDir,
    InvalidStateKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyStateDir => write!(f, "AUDIT_FEE_STATE_DIR must not be empty"),
            ConfigError::InvalidStateKey(key) => write!(
                f,
                "AUDIT_FEE_STATE_KEY '{key}' must be letters, digits, '_', '-' or '.' and not start with '.'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
