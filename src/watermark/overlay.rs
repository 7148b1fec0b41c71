//! Overlay image loading, caching and scaling.
//!
//! The engine never touches the file system itself: it asks an
//! [`OverlayStore`] for a decoded overlay by key. Two stores are provided:
//!
//! - [`FsOverlayStore`] - keys are file paths, decoded on every fetch
//! - [`MemoryOverlayStore`] - keys map to rasters registered up front
//!
//! # Scaling
//!
//! Overlays are resized relative to the base image width:
//! `width = floor(base_width * scale)`, `height = h * width / w` (integer
//! division), both at least 1 pixel.
//!
//! # Example
//!
//! ```ignore
//! use photomark::watermark::overlay::{render_overlay, FsOverlayStore};
//! use photomark::watermark::ImageSpec;
//!
//! let store = FsOverlayStore::new();
//! let spec = ImageSpec::new("logo.png", 0.2)?;
//!
//! let patch = render_overlay(&spec, 500, &store)?;
//! ```

use super::config::ImageSpec;
use super::WatermarkError;
use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::RgbaImage;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Source of decoded overlay rasters.
pub trait OverlayStore: Send + Sync {
    /// Return the overlay registered under `source`.
    ///
    /// # Errors
    ///
    /// `AssetUnavailable` when the overlay cannot be found or decoded.
    fn fetch(&self, source: &str) -> Result<Arc<RgbaImage>, WatermarkError>;
}

/// File-backed overlay store. Keys are paths.
///
/// Every fetch decodes the file again, so an overlay replaced on disk shows up
/// in the next render.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOverlayStore;

impl FsOverlayStore {
    pub fn new() -> Self {
        Self
    }
}

impl OverlayStore for FsOverlayStore {
    fn fetch(&self, source: &str) -> Result<Arc<RgbaImage>, WatermarkError> {
        let image = decode_file(Path::new(source))?;
        debug!(
            path = source,
            width = image.width(),
            height = image.height(),
            "Loaded overlay image"
        );
        Ok(Arc::new(image))
    }
}

fn decode_file(path: &Path) -> Result<RgbaImage, WatermarkError> {
    let reader = ImageReader::open(path)
        .map_err(|e| WatermarkError::asset(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| WatermarkError::asset(format!("{}: {}", path.display(), e)))?;

    let image = reader
        .decode()
        .map_err(|e| WatermarkError::asset(format!("{}: {}", path.display(), e)))?;

    Ok(image.to_rgba8())
}

/// In-memory overlay store.
#[derive(Debug, Default, Clone)]
pub struct MemoryOverlayStore {
    images: HashMap<String, Arc<RgbaImage>>,
}

impl MemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, image: RgbaImage) {
        self.images.insert(key.into(), Arc::new(image));
    }

    pub fn with_overlay(mut self, key: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(key, image);
        self
    }
}

impl OverlayStore for MemoryOverlayStore {
    fn fetch(&self, source: &str) -> Result<Arc<RgbaImage>, WatermarkError> {
        self.images
            .get(source)
            .cloned()
            .ok_or_else(|| WatermarkError::asset(format!("{source}: not registered")))
    }
}

/// Target size of an overlay of `original` size on a base `base_width` wide.
///
/// # Errors
///
/// `RenderError` when the proportional height does not fit in a `u32`.
pub fn scaled_dimensions(
    original: (u32, u32),
    base_width: u32,
    scale: f32,
) -> Result<(u32, u32), WatermarkError> {
    let (orig_w, orig_h) = original;
    // f32 scales like 0.7 sit just below their decimal value
    let width = ((base_width as f64 * scale as f64) + 1e-4).floor() as u32;
    let width = width.max(1);
    if orig_w == 0 {
        return Ok((width, 1));
    }

    let height = (orig_h as u64 * width as u64 / orig_w as u64).max(1);
    let height = u32::try_from(height).map_err(|_| {
        WatermarkError::RenderError(format!(
            "Scaled overlay height {height} exceeds the maximum image size"
        ))
    })?;
    Ok((width, height))
}

/// Fetch the overlay for `spec` and scale it against the base width.
pub fn render_overlay(
    spec: &ImageSpec,
    base_width: u32,
    store: &dyn OverlayStore,
) -> Result<RgbaImage, WatermarkError> {
    let original = store.fetch(spec.overlay())?;
    let (target_w, target_h) =
        scaled_dimensions(original.dimensions(), base_width, spec.scale())?;

    debug!(
        source = spec.overlay(),
        original_width = original.width(),
        original_height = original.height(),
        width = target_w,
        height = target_h,
        "Scaling overlay"
    );

    if original.dimensions() == (target_w, target_h) {
        return Ok(original.as_ref().clone());
    }
    resize_rgba(&original, target_w, target_h)
}

/// Resize an RGBA raster with Lanczos3, treating alpha as premultiplied so
/// transparent edges do not bleed colour.
pub fn resize_rgba(
    image: &RgbaImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage, WatermarkError> {
    let src_width = NonZeroU32::new(image.width())
        .ok_or_else(|| WatermarkError::RenderError("Overlay width is 0".to_string()))?;
    let src_height = NonZeroU32::new(image.height())
        .ok_or_else(|| WatermarkError::RenderError("Overlay height is 0".to_string()))?;
    let dst_width = NonZeroU32::new(target_w)
        .ok_or_else(|| WatermarkError::RenderError("Target width is 0".to_string()))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| WatermarkError::RenderError("Target height is 0".to_string()))?;

    let mut src_image =
        Image::from_vec_u8(src_width, src_height, image.as_raw().clone(), PixelType::U8x4)
            .map_err(|e| {
                WatermarkError::RenderError(format!("Failed to create source image: {:?}", e))
            })?;

    let mul_div = MulDiv::default();
    mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| WatermarkError::RenderError(format!("Alpha premultiply failed: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::RenderError(format!("Resize operation failed: {:?}", e)))?;

    mul_div
        .divide_alpha_inplace(&mut dst_image.view_mut())
        .map_err(|e| WatermarkError::RenderError(format!("Alpha unpremultiply failed: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec()).ok_or_else(|| {
        WatermarkError::RenderError("Failed to create output image buffer".to_string())
    })
}
