//! Application configuration.
//!
//! Loaded from YAML with `${VAR}` environment substitution. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration.
//!
//! ```yaml
//! fonts:
//!   preferred: /usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf
//! templates:
//!   path: watermark_templates.json
//! export:
//!   jpeg_quality: 90
//!   jpeg_background: "#FFFFFF"
//!   prefix: ""
//!   suffix: "_watermarked"
//! logging:
//!   level: info
//!   format: pretty
//! ```

mod export;
mod logging;

pub use export::ExportConfig;
pub use logging::{LogFormat, LoggingConfig};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::templates::DEFAULT_STORE_FILE;
use crate::watermark::DEFAULT_FONT_PATH;

/// Config file looked up when none is named explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "photomark.yaml";

fn default_font_path() -> PathBuf {
    PathBuf::from(DEFAULT_FONT_PATH)
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontsConfig {
    /// Outline font tried first; the built-in bitmap font is used when it
    /// cannot be loaded.
    #[serde(default = "default_font_path")]
    pub preferred: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            preferred: default_font_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, AppError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| AppError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                AppError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document deserializes to null
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Load an explicitly named file, or the default file if it exists.
    ///
    /// Only a missing default file falls back to built-in defaults; a named
    /// file must exist and parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.templates.path.as_os_str().is_empty() {
            return Err(AppError::Config("templates.path cannot be empty".to_string()));
        }
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
