//! Watermark compositor for blending watermarks onto images.
//!
//! This module handles alpha blending of watermark patches onto a copy of the
//! base image and rotation of the finished canvas.
//!
//! # Features
//!
//! - Porter-Duff "over" blending, clipped to the canvas
//! - Text layers always drawn before image layers
//! - Whole-canvas counter-clockwise rotation with bounds expansion
//!
//! # Example
//!
//! ```ignore
//! use photomark::watermark::compositor::{Compositor, LayerKind, WatermarkLayer};
//! use photomark::watermark::position::PlacementPosition;
//!
//! let mut compositor = Compositor::new();
//! compositor.add_layer(WatermarkLayer {
//!     image: text_patch,
//!     position: PlacementPosition::new(10, 10),
//!     kind: LayerKind::Text,
//! });
//!
//! let result = compositor.composite(&base, RotationAngle::default());
//! ```

use super::config::RotationAngle;
use super::position::{visible_region, ImageDimensions, PlacementPosition, WatermarkDimensions};
use image::{imageops, Rgba, RgbaImage};
use tracing::debug;

/// Which watermark element a layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerKind {
    Text,
    Image,
}

/// A watermark layer to be composited onto an image.
#[derive(Clone)]
pub struct WatermarkLayer {
    /// The watermark patch (RGBA).
    pub image: RgbaImage,
    /// Top-left anchor on the base canvas.
    pub position: PlacementPosition,
    pub kind: LayerKind,
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Compositor for applying watermarks to images.
#[derive(Debug, Default)]
pub struct Compositor {
    layers: Vec<WatermarkLayer>,
}

impl Compositor {
    /// Create a new compositor with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a watermark layer to the compositor.
    pub fn add_layer(&mut self, layer: WatermarkLayer) {
        self.layers.push(layer);
    }

    /// Get the number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Blend all layers onto a copy of `base`, then rotate the result.
    ///
    /// Text layers are blended before image layers regardless of the order
    /// they were added in. `base` is never modified.
    pub fn composite(&self, base: &RgbaImage, angle: RotationAngle) -> RgbaImage {
        let mut canvas = base.clone();

        let mut ordered: Vec<&WatermarkLayer> = self.layers.iter().collect();
        ordered.sort_by_key(|layer| layer.kind);

        for layer in ordered {
            blend_layer(&mut canvas, layer);
        }

        rotate_canvas(&canvas, angle)
    }
}

/// Blend a single watermark layer onto the target image.
///
/// Patch pixels that fall outside the target are skipped.
pub fn blend_layer(target: &mut RgbaImage, layer: &WatermarkLayer) {
    let region = visible_region(
        layer.position,
        &WatermarkDimensions::of(&layer.image),
        &ImageDimensions::of(target),
    );

    let Some(region) = region else {
        debug!(
            x = layer.position.x,
            y = layer.position.y,
            kind = ?layer.kind,
            "Watermark layer entirely off-canvas"
        );
        return;
    };

    for ty in region.y..region.bottom() as i32 {
        for tx in region.x..region.right() as i32 {
            let wx = (tx - layer.position.x) as u32;
            let wy = (ty - layer.position.y) as u32;

            let wm_pixel = *layer.image.get_pixel(wx, wy);
            let target_pixel = target.get_pixel_mut(tx as u32, ty as u32);
            *target_pixel = blend_pixels(*target_pixel, wm_pixel);
        }
    }
}

/// Blend `foreground` over `background` with the Porter-Duff "over" operator.
///
/// Over an opaque background this is `src * a + dst * (1 - a)` per channel.
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    if foreground[3] == 0 {
        return background;
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Size of the canvas needed to hold `(width, height)` rotated by `degrees`.
pub fn rotated_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let radians = degrees.to_radians();
    let cos = radians.cos().abs();
    let sin = radians.sin().abs();

    // epsilon keeps exact fits (e.g. 90 degrees) from growing by a pixel
    let w = (width as f64 * cos + height as f64 * sin - 1e-6).ceil().max(1.0) as u32;
    let h = (width as f64 * sin + height as f64 * cos - 1e-6).ceil().max(1.0) as u32;
    (w, h)
}

/// Rotate the whole canvas counter-clockwise, expanding it to fit.
///
/// Quarter turns are exact pixel permutations. Other angles are resampled
/// with nearest neighbour; exposed corners are transparent.
pub fn rotate_canvas(image: &RgbaImage, angle: RotationAngle) -> RgbaImage {
    if angle.is_identity() {
        return image.clone();
    }

    match angle.degrees() {
        90 => imageops::rotate270(image),
        180 => imageops::rotate180(image),
        270 => imageops::rotate90(image),
        degrees => rotate_nearest(image, degrees as f64),
    }
}

fn rotate_nearest(image: &RgbaImage, degrees: f64) -> RgbaImage {
    let (src_w, src_h) = image.dimensions();
    let (dst_w, dst_h) = rotated_dimensions(src_w, src_h, degrees);

    let radians = degrees.to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_cx = src_w as f64 / 2.0;
    let src_cy = src_h as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = RgbaImage::new(dst_w, dst_h);

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        // pixel centre relative to the output centre (y down)
        let dx = x as f64 + 0.5 - dst_cx;
        let dy = y as f64 + 0.5 - dst_cy;

        // inverse of a visual counter-clockwise rotation
        let sx = dx * cos - dy * sin + src_cx;
        let sy = dx * sin + dy * cos + src_cy;

        if sx >= 0.0 && sy >= 0.0 && sx < src_w as f64 && sy < src_h as f64 {
            *pixel = *image.get_pixel(sx as u32, sy as u32);
        }
    }

    debug!(
        degrees,
        width = dst_w,
        height = dst_h,
        "Rotated canvas"
    );

    output
}
