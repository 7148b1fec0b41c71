//! Position calculation for watermark placement.
//!
//! This module resolves where a watermark patch goes on a canvas and provides
//! the bounding-box geometry the compositor works with.
//!
//! # Placement
//!
//! - **9-grid presets**: left/center/right crossed with top/middle/bottom,
//!   flush against the canvas edges (no margin)
//! - **Manual point**: an explicit top-left coordinate, used verbatim
//!
//! Anchors may be negative or extend past the canvas; clipping is the
//! compositor's job.
//!
//! # Example
//!
//! ```ignore
//! use photomark::watermark::position::{resolve, ImageDimensions, WatermarkDimensions};
//! use photomark::watermark::{GridPreset, Placement};
//!
//! let canvas = ImageDimensions { width: 800, height: 600 };
//! let watermark = WatermarkDimensions { width: 100, height: 50 };
//!
//! let anchor = resolve(&canvas, &watermark, &Placement::grid(GridPreset::BottomRight));
//! assert_eq!((anchor.x, anchor.y), (700, 550));
//! ```

use super::config::{Align, Placement};
use image::RgbaImage;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

impl WatermarkDimensions {
    pub fn of(patch: &RgbaImage) -> Self {
        Self {
            width: patch.width(),
            height: patch.height(),
        }
    }

    /// Smallest box that contains both patches when they share a top-left
    /// anchor.
    pub fn union(&self, other: &WatermarkDimensions) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// Top-left anchor of a watermark, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlap of two boxes, `None` when they do not touch.
    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(BoundingBox::new(
            left as i32,
            top as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

fn align_offset(align: Align, canvas: u32, watermark: u32) -> i32 {
    let free = canvas as i32 - watermark as i32;
    match align {
        Align::Start => 0,
        // floor division, also for oversized watermarks
        Align::Middle => free.div_euclid(2),
        Align::End => free,
    }
}

/// Resolve the top-left anchor for a watermark of the given size.
///
/// A manual point wins over the preset and is returned unclamped. Grid
/// results may be negative when the watermark is larger than the canvas.
pub fn resolve(
    canvas: &ImageDimensions,
    watermark: &WatermarkDimensions,
    placement: &Placement,
) -> PlacementPosition {
    if let Some(point) = placement.manual_point() {
        return PlacementPosition::new(point.x, point.y);
    }

    let preset = placement.preset();
    PlacementPosition::new(
        align_offset(preset.horizontal(), canvas.width, watermark.width),
        align_offset(preset.vertical(), canvas.height, watermark.height),
    )
}

/// Box covered by a patch placed at `anchor`.
pub fn placed_box(anchor: PlacementPosition, watermark: &WatermarkDimensions) -> BoundingBox {
    BoundingBox::new(anchor.x, anchor.y, watermark.width, watermark.height)
}

/// The part of a placed patch that lands on the canvas.
///
/// Returns `None` when the patch is entirely off-canvas.
pub fn visible_region(
    anchor: PlacementPosition,
    watermark: &WatermarkDimensions,
    canvas: &ImageDimensions,
) -> Option<BoundingBox> {
    let canvas_box = BoundingBox::new(0, 0, canvas.width, canvas.height);
    placed_box(anchor, watermark).intersect(&canvas_box)
}

/// Check if a watermark at the given position would be visible on the image.
pub fn is_visible(
    anchor: PlacementPosition,
    watermark: &WatermarkDimensions,
    canvas: &ImageDimensions,
) -> bool {
    visible_region(anchor, watermark, canvas).is_some()
}

/// Tight box around the pixels of `patch` with non-zero alpha, in patch
/// coordinates. `None` for a fully transparent patch.
pub fn alpha_bounds(patch: &RgbaImage) -> Option<BoundingBox> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in patch.enumerate_pixels() {
        if pixel[3] > 0 {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    found.then(|| {
        BoundingBox::new(
            min_x as i32,
            min_y as i32,
            max_x - min_x + 1,
            max_y - min_y + 1,
        )
    })
}
