//! Watermark error types.
//!
//! Defines errors that can occur while validating, rendering or exporting a
//! watermark. Font problems never show up here: they are recovered by the
//! built-in fallback font.

use std::fmt;

/// Errors that can occur during watermark processing.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkError {
    /// Configuration rejected at construction time (empty text, font size,
    /// scale or angle out of range)
    InvalidConfiguration(String),

    /// Overlay image could not be loaded or decoded
    AssetUnavailable(String),

    /// Render or export requested without a base image
    NoSourceImage,

    /// Failed to produce a watermark patch
    RenderError(String),

    /// Failed to encode or write the rendered image
    EncodeFailed { format: String, message: String },
}

impl WatermarkError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn asset(message: impl Into<String>) -> Self {
        Self::AssetUnavailable(message.into())
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(msg) => {
                write!(f, "Invalid watermark configuration: {}", msg)
            }
            Self::AssetUnavailable(msg) => write!(f, "Watermark asset unavailable: {}", msg),
            Self::NoSourceImage => write!(f, "No source image loaded"),
            Self::RenderError(msg) => write!(f, "Failed to render watermark: {}", msg),
            Self::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for WatermarkError {}
