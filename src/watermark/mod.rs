//! Watermark compositing engine.
//!
//! Given a base image and a [`Configuration`], the engine deterministically
//! produces a new raster with the watermark composited at the right place,
//! orientation and blend. The caller's image is never modified.
//!
//! # Features
//!
//! - **Text watermarks** rendered with an outline font, or a built-in bitmap
//!   font when the outline font is unavailable
//! - **Image watermarks** scaled proportionally to the base width
//! - **9-grid placement** with a manual point override
//! - **Whole-canvas rotation** with bounds expansion
//!
//! # Pipeline
//!
//! ```text
//! Configuration ─▶ patches (text, overlay) ─▶ anchor ─▶ blend onto copy ─▶ rotate
//! ```
//!
//! # Example
//!
//! ```ignore
//! use photomark::watermark::{Color, Configuration, GridPreset, TextSpec, WatermarkEngine};
//!
//! let engine = WatermarkEngine::default();
//! let config = Configuration::new()
//!     .with_text(TextSpec::new("TEST", 40, Color::black())?)
//!     .with_preset(GridPreset::BottomRight);
//!
//! let rendered = engine.render(Some(&base), &config)?;
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod overlay;
pub mod position;
pub mod processor;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{
    blend_pixels, rotate_canvas, rotated_dimensions, Compositor, LayerKind, WatermarkLayer,
};
pub use config::{
    parse_hex_color, Color, Configuration, ConfigurationRecord, GridPreset, ImageSpec,
    ManualPoint, Placement, RotationAngle, TextSpec, WatermarkSpec,
};
pub use error::WatermarkError;
pub use overlay::{FsOverlayStore, MemoryOverlayStore, OverlayStore};
pub use position::{
    alpha_bounds, is_visible, placed_box, resolve, visible_region, BoundingBox, ImageDimensions,
    PlacementPosition, WatermarkDimensions,
};
pub use processor::WatermarkEngine;
pub use text_renderer::{FontResolver, DEFAULT_FONT_PATH};
