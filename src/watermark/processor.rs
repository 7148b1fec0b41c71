//! Watermark engine: the render entry point.
//!
//! [`WatermarkEngine::render`] is a pure function of the base image and a
//! [`Configuration`]: every call starts from the caller's pristine base,
//! builds fresh patches, composites them onto a copy and rotates the result.
//! The engine holds no per-render state, so one engine can serve many
//! threads.
//!
//! # Example
//!
//! ```ignore
//! use photomark::watermark::processor::WatermarkEngine;
//! use photomark::watermark::{Color, Configuration, GridPreset, TextSpec};
//!
//! let engine = WatermarkEngine::default();
//! let config = Configuration::new()
//!     .with_text(TextSpec::new("© me", 40, Color::black())?)
//!     .with_preset(GridPreset::BottomRight);
//!
//! let rendered = engine.render(Some(&base), &config)?;
//! ```

use super::compositor::{Compositor, LayerKind, WatermarkLayer};
use super::config::{Configuration, WatermarkSpec};
use super::overlay::{render_overlay, FsOverlayStore, OverlayStore};
use super::position::{resolve, ImageDimensions, PlacementPosition, WatermarkDimensions};
use super::text_renderer::FontResolver;
use super::WatermarkError;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Stateless watermark renderer.
#[derive(Clone)]
pub struct WatermarkEngine {
    fonts: Arc<FontResolver>,
    overlays: Arc<dyn OverlayStore>,
}

impl WatermarkEngine {
    pub fn new(fonts: Arc<FontResolver>, overlays: Arc<dyn OverlayStore>) -> Self {
        Self { fonts, overlays }
    }

    pub fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    /// Render one watermark patch for `spec` against a base `base_width` wide.
    pub fn render_patch(
        &self,
        spec: WatermarkSpec<'_>,
        base_width: u32,
    ) -> Result<WatermarkLayer, WatermarkError> {
        let (image, kind) = match spec {
            WatermarkSpec::Text(text) => (self.fonts.render_text(text), LayerKind::Text),
            WatermarkSpec::Image(overlay) => (
                render_overlay(overlay, base_width, self.overlays.as_ref())?,
                LayerKind::Image,
            ),
        };

        Ok(WatermarkLayer {
            image,
            position: PlacementPosition::new(0, 0),
            kind,
        })
    }

    /// Build the positioned layers for `config` on a canvas of `canvas` size.
    ///
    /// Text and image share one anchor, resolved against the union of their
    /// patch sizes.
    pub fn layout(
        &self,
        canvas: &ImageDimensions,
        config: &Configuration,
    ) -> Result<Compositor, WatermarkError> {
        let layers = config
            .specs()
            .into_iter()
            .map(|spec| self.render_patch(spec, canvas.width))
            .collect::<Result<Vec<_>, _>>()?;

        let mut compositor = Compositor::new();
        let Some(union) = layers
            .iter()
            .map(|layer| WatermarkDimensions::of(&layer.image))
            .reduce(|a, b| a.union(&b))
        else {
            return Ok(compositor);
        };

        let anchor = resolve(canvas, &union, &config.placement());
        debug!(
            x = anchor.x,
            y = anchor.y,
            width = union.width,
            height = union.height,
            manual = config.placement().is_manual(),
            preset = %config.placement().preset(),
            "Resolved watermark anchor"
        );

        for mut layer in layers {
            layer.position = anchor;
            compositor.add_layer(layer);
        }
        Ok(compositor)
    }

    /// Render `config` onto a copy of `base`.
    ///
    /// # Errors
    ///
    /// - `NoSourceImage` when `base` is `None`
    /// - `AssetUnavailable` when the overlay cannot be loaded
    pub fn render(
        &self,
        base: Option<&RgbaImage>,
        config: &Configuration,
    ) -> Result<RgbaImage, WatermarkError> {
        let base = base.ok_or(WatermarkError::NoSourceImage)?;
        let started = Instant::now();

        let compositor = self.layout(&ImageDimensions::of(base), config)?;
        let rendered = compositor.composite(base, config.angle());

        info!(
            template = config.name().unwrap_or("-"),
            layers = compositor.layer_count(),
            angle = config.angle().degrees(),
            width = rendered.width(),
            height = rendered.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered watermark"
        );
        Ok(rendered)
    }

    /// Decode `data` and render `config` onto it.
    pub fn render_bytes(
        &self,
        data: &[u8],
        config: &Configuration,
    ) -> Result<RgbaImage, WatermarkError> {
        if data.is_empty() {
            return Err(WatermarkError::NoSourceImage);
        }
        let base = image::load_from_memory(data)
            .map_err(|e| WatermarkError::asset(format!("source image: {e}")))?
            .to_rgba8();
        self.render(Some(&base), config)
    }
}

impl Default for WatermarkEngine {
    /// Preferred system font and a file-backed overlay store.
    fn default() -> Self {
        Self::new(
            Arc::new(FontResolver::default()),
            Arc::new(FsOverlayStore::new()),
        )
    }
}

impl std::fmt::Debug for WatermarkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkEngine")
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}
