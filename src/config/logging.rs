//! Logging configuration types.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

fn default_level() -> String {
    "info".to_string()
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `photomark=debug` (default: info).
    /// `RUST_LOG` overrides it.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| AppError::Config(format!("logging.level '{}': {}", self.level, e)))
    }
}
