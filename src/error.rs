// Error types module

use std::path::PathBuf;
use thiserror::Error;

use crate::templates::TemplateStoreError;
use crate::watermark::WatermarkError;

/// Crate-level error for callers of the engine (CLI, session, batch).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error(transparent)]
    Templates(#[from] TemplateStoreError),

    /// Source image could not be opened or decoded
    #[error("Failed to load image {}: {message}", .path.display())]
    ImageLoad { path: PathBuf, message: String },

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
