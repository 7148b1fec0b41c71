//! Export configuration types.
//!
//! Controls how rendered images are written:
//! - JPEG quality and the background transparent pixels are flattened onto
//! - Default output file name prefix and suffix

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::export::{EncoderQuality, ExportOptions};
use crate::watermark::parse_hex_color;

fn default_jpeg_quality() -> u8 {
    90
}

fn default_jpeg_background() -> String {
    "#FFFFFF".to_string()
}

fn default_suffix() -> String {
    "_watermarked".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// JPEG quality, 1-100 (default: 90)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Hex colour for flattening JPEG output (default: white)
    #[serde(default = "default_jpeg_background")]
    pub jpeg_background: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            jpeg_background: default_jpeg_background(),
            prefix: String::new(),
            suffix: default_suffix(),
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config(format!(
                "export.jpeg_quality must be within [1, 100], got {}",
                self.jpeg_quality
            )));
        }
        parse_hex_color(&self.jpeg_background)
            .map_err(|e| AppError::Config(format!("export.jpeg_background: {}", e)))?;
        Ok(())
    }

    pub fn options(&self) -> Result<ExportOptions, AppError> {
        let background = parse_hex_color(&self.jpeg_background)
            .map_err(|e| AppError::Config(format!("export.jpeg_background: {}", e)))?;
        Ok(ExportOptions {
            quality: EncoderQuality::with_quality(self.jpeg_quality),
            background,
        })
    }
}
