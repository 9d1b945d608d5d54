use crate::store::StorePaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("executor_url must point at loopback, got {url}")]
    NonLoopbackExecutor { url: String },
    #[error("invalid setting {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Orchestrator settings, loaded from an optional `config.yaml` at the store
/// root. Every field has a default, so a missing file means pure defaults; a
/// present but malformed file is a fatal startup error.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_agent_program")]
    pub agent_program: String,
    #[serde(default = "default_agent_allowed_tools")]
    pub agent_allowed_tools: String,
    #[serde(default = "default_agent_timeout_seconds")]
    pub agent_timeout_seconds: u64,
    #[serde(default = "default_executor_url")]
    pub executor_url: String,
    #[serde(default = "default_executor_timeout_seconds")]
    pub executor_timeout_seconds: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_agent_program() -> String {
    "claude".to_string()
}

fn default_agent_allowed_tools() -> String {
    "Read,Write,Edit,Glob,Grep".to_string()
}

fn default_agent_timeout_seconds() -> u64 {
    300
}

fn default_executor_url() -> String {
    "http://127.0.0.1:3000/send-message".to_string()
}

fn default_executor_timeout_seconds() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_settle_delay_ms() -> u64 {
    1000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agent_program: default_agent_program(),
            agent_allowed_tools: default_agent_allowed_tools(),
            agent_timeout_seconds: default_agent_timeout_seconds(),
            executor_url: default_executor_url(),
            executor_timeout_seconds: default_executor_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Settings {
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_seconds)
    }

    pub fn executor_timeout(&self) -> Duration {
        Duration::from_secs(self.executor_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Startup validation. The loopback restriction is also re-checked per
    /// call by the executor client; failing here keeps a misconfigured store
    /// from starting at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !crate::actions::is_loopback_url(&self.executor_url) {
            return Err(ConfigError::NonLoopbackExecutor {
                url: self.executor_url.clone(),
            });
        }
        if self.agent_program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "agent_program",
                reason: "must not be empty".to_string(),
            });
        }
        if self.agent_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent_timeout_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.executor_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executor_timeout_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads and validates settings for a store. A missing `config.yaml` yields
/// defaults; any other read or parse failure is fatal.
pub fn load_settings(paths: &StorePaths) -> Result<Settings, ConfigError> {
    let path = paths.settings_file();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let settings = Settings::default();
            settings.validate()?;
            return Ok(settings);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let settings: Settings = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    settings.validate()?;
    Ok(settings)
}
