//! Export of rendered images
//!
//! Provides:
//! - Output format inference from the destination extension (PNG fallback)
//! - Encoders for JPEG, PNG, WebP, GIF, BMP and TIFF
//! - JPEG flattening onto a configurable background colour
//! - Output file naming (`prefix + stem + suffix + ext`)

pub mod encoder;
pub mod format;

pub use encoder::{flatten, EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use format::OutputFormat;

use crate::watermark::{Color, WatermarkError};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Settings shared by every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub quality: EncoderQuality,
    /// Backdrop for formats without alpha.
    pub background: Color,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            quality: EncoderQuality::default(),
            background: Color::white(),
        }
    }
}

/// Encode `image` to `format` in memory.
pub fn encode(
    image: &RgbaImage,
    format: OutputFormat,
    options: &ExportOptions,
) -> Result<EncodedImage, WatermarkError> {
    EncoderFactory::create(format, options.background).encode(image, options.quality)
}

/// Encode `image` in the format implied by `destination` and write it.
///
/// Returns the format that was written.
pub fn save(
    image: &RgbaImage,
    destination: &Path,
    options: &ExportOptions,
) -> Result<OutputFormat, WatermarkError> {
    let format = OutputFormat::from_path(destination);
    let encoded = encode(image, format, options)?;

    std::fs::write(destination, &encoded.data).map_err(|e| {
        WatermarkError::encode_failed(
            format.as_str(),
            format!("{}: {}", destination.display(), e),
        )
    })?;

    info!(
        path = %destination.display(),
        format = format.as_str(),
        bytes = encoded.data.len(),
        "Exported image"
    );
    Ok(format)
}

/// Output file name for `source`: `prefix + stem + suffix + ext`.
///
/// The extension is kept as written, including its case. Returns `None` when
/// `source` has no file name.
pub fn compose_file_name(source: &Path, prefix: &str, suffix: &str) -> Option<String> {
    let stem = source.file_stem()?.to_string_lossy();
    let ext = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    Some(format!("{prefix}{stem}{suffix}{ext}"))
}

/// Full destination path for `source` exported into `dir`.
pub fn destination_path(dir: &Path, source: &Path, prefix: &str, suffix: &str) -> Option<PathBuf> {
    compose_file_name(source, prefix, suffix).map(|name| dir.join(name))
}
