//! Text watermark rendering.
//!
//! This module rasterises text watermarks to RGBA patches that can be
//! composited onto target images.
//!
//! # Features
//!
//! - Outline font loaded from a TrueType/OpenType file at runtime
//! - Built-in 8x8 bitmap font when the outline font is unavailable
//! - RGBA fill colour, transparent background, no stroke
//!
//! Font resolution happens once per [`FontResolver`]. A missing or corrupt font
//! file is logged and recovered; rendering text never fails because of fonts.
//!
//! # Example
//!
//! ```ignore
//! use photomark::watermark::text_renderer::FontResolver;
//! use photomark::watermark::{Color, TextSpec};
//!
//! let fonts = FontResolver::load("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf");
//! let spec = TextSpec::new("Copyright 2025", 40, Color::white())?;
//!
//! let patch = fonts.render_text(&spec);
//! ```

use super::config::{Color, TextSpec};
use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, info, warn};

/// Preferred bold outline font.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

/// Extra pixels around outline-rendered text so antialiased edges are kept.
const OUTLINE_PADDING: u32 = 2;

/// Side length of a built-in bitmap glyph.
const BITMAP_GLYPH_SIZE: u32 = 8;

enum FontSource {
    Outline(FontVec),
    Bitmap,
}

/// Resolved font used for all text rendering.
///
/// Immutable after construction and safe to share between threads.
pub struct FontResolver {
    source: FontSource,
}

impl FontResolver {
    /// Load the outline font at `path`, falling back to the built-in bitmap
    /// font if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(data) => match FontVec::try_from_vec(data) {
                Ok(font) => {
                    info!(path = %path.display(), "Loaded watermark font");
                    Self {
                        source: FontSource::Outline(font),
                    }
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Invalid font file, using built-in bitmap font"
                    );
                    Self::builtin()
                }
            },
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Font file unavailable, using built-in bitmap font"
                );
                Self::builtin()
            }
        }
    }

    /// Use font data already in memory, falling back like [`FontResolver::load`].
    pub fn from_font_data(data: Vec<u8>) -> Self {
        match FontVec::try_from_vec(data) {
            Ok(font) => Self {
                source: FontSource::Outline(font),
            },
            Err(e) => {
                warn!(error = %e, "Invalid font data, using built-in bitmap font");
                Self::builtin()
            }
        }
    }

    /// The built-in 8x8 bitmap font.
    pub fn builtin() -> Self {
        Self {
            source: FontSource::Bitmap,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, FontSource::Bitmap)
    }

    /// Size of the patch `render_text` would produce, as (width, height).
    pub fn measure_text(&self, text: &str, font_size: u32) -> (u32, u32) {
        match &self.source {
            FontSource::Outline(font) => measure_outline(font, text, font_size),
            FontSource::Bitmap => measure_bitmap(text, font_size),
        }
    }

    /// Render a text spec to a transparent patch tightly sized to the text.
    pub fn render_text(&self, spec: &TextSpec) -> RgbaImage {
        let image = match &self.source {
            FontSource::Outline(font) => render_outline(font, spec),
            FontSource::Bitmap => render_bitmap(spec),
        };
        debug!(
            chars = spec.content().chars().count(),
            font_size = spec.font_size(),
            width = image.width(),
            height = image.height(),
            fallback = self.is_fallback(),
            "Rendered text patch"
        );
        image
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::load(DEFAULT_FONT_PATH)
    }
}

impl std::fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.source {
            FontSource::Outline(_) => "outline",
            FontSource::Bitmap => "bitmap",
        };
        f.debug_struct("FontResolver").field("source", &kind).finish()
    }
}

fn measure_outline(font: &FontVec, text: &str, font_size: u32) -> (u32, u32) {
    let scaled_font = font.as_scaled(PxScale::from(font_size as f32));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let height = scaled_font.height();
    (
        (width.ceil().max(0.0) as u32 + OUTLINE_PADDING).max(1),
        (height.ceil().max(0.0) as u32 + OUTLINE_PADDING).max(1),
    )
}

fn render_outline(font: &FontVec, spec: &TextSpec) -> RgbaImage {
    let scale = PxScale::from(spec.font_size() as f32);
    let scaled_font = font.as_scaled(scale);
    let (width, height) = measure_outline(font, spec.content(), spec.font_size());
    let color = spec.color();

    let mut image = RgbaImage::new(width, height);

    let pad = (OUTLINE_PADDING / 2) as f32;
    let baseline_y = pad + scaled_font.ascent();
    let mut cursor_x = pad;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in spec.content().chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && y >= 0 && x < width as i32 && y < height as i32 {
                    let alpha = (coverage.clamp(0.0, 1.0) * color.a as f32).round() as u8;
                    cover_pixel(&mut image, x as u32, y as u32, color, alpha);
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    image
}

fn bitmap_glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn measure_bitmap(text: &str, font_size: u32) -> (u32, u32) {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    (chars.saturating_mul(font_size).max(1), font_size.max(1))
}

/// Each 8x8 glyph fills a `font_size` square, scaled by nearest neighbour.
fn render_bitmap(spec: &TextSpec) -> RgbaImage {
    let cell = spec.font_size();
    let (width, height) = measure_bitmap(spec.content(), cell);
    let color = spec.color();

    let mut image = RgbaImage::new(width, height);

    for (index, c) in spec.content().chars().enumerate() {
        let glyph = bitmap_glyph(c);
        let origin_x = index as u32 * cell;

        for py in 0..cell {
            let bits = glyph[(py * BITMAP_GLYPH_SIZE / cell) as usize];
            for px in 0..cell {
                let col = px * BITMAP_GLYPH_SIZE / cell;
                if (bits >> col) & 1 == 1 {
                    cover_pixel(&mut image, origin_x + px, py, color, color.a);
                }
            }
        }
    }

    image
}

/// Paint `color` at the given coverage alpha, keeping the stronger coverage
/// where glyphs overlap.
fn cover_pixel(image: &mut RgbaImage, x: u32, y: u32, color: Color, alpha: u8) {
    let existing = image.get_pixel(x, y)[3];
    if alpha > existing {
        image.put_pixel(x, y, Rgba([color.r, color.g, color.b, alpha]));
    }
}
