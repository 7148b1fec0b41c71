//! Watermark configuration types.
//!
//! This module defines the value objects describing one watermark request:
//! - Text watermarks (content, font size, RGBA colour)
//! - Image watermarks (overlay source and proportional scale)
//! - Placement (9-grid preset with an optional manual point override)
//! - Whole-canvas rotation angle
//!
//! Every type validates on construction, so a [`Configuration`] that exists is
//! always renderable. Configurations are immutable: the `with_*` methods return
//! a new value and leave the receiver untouched.

use super::WatermarkError;
use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Smallest accepted text font size in pixels.
pub const MIN_FONT_SIZE: u32 = 10;
/// Largest accepted text font size in pixels.
pub const MAX_FONT_SIZE: u32 = 200;
/// Largest accepted rotation angle in degrees.
pub const MAX_ANGLE: u16 = 360;

pub fn default_font_size() -> u32 {
    40
}

pub fn default_scale() -> f32 {
    0.2
}

/// RGBA colour.
///
/// Serialized as `#RRGGBB` when opaque and `#RRGGBBAA` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque colour.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn to_hex(self) -> String {
        if self.is_opaque() {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Parse a hex color string into RGBA components.
///
/// Supports #RGB, #RRGGBB and #RRGGBBAA. Colours without an alpha component
/// are opaque.
///
/// # Examples
///
/// ```
/// use photomark::watermark::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::white());
/// assert_eq!(parse_hex_color("#FF000080").unwrap(), Color::rgba(255, 0, 0, 128));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::invalid(format!("Color must start with '#', got '{hex}'")))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WatermarkError::invalid(format!(
            "Color contains non-hex characters: '{hex}'"
        )));
    }

    let byte = |range: std::ops::Range<usize>| -> Result<u8, WatermarkError> {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| WatermarkError::invalid(format!("Invalid hex digit in '{hex}'")))
    };

    match digits.len() {
        3 => {
            // #RGB - each digit doubled: 0xF -> 0xFF
            let r = byte(0..1)?;
            let g = byte(1..2)?;
            let b = byte(2..3)?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
        8 => Ok(Color::rgba(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
        n => Err(WatermarkError::invalid(format!(
            "Color must be #RGB, #RRGGBB or #RRGGBBAA, got {n} hex digits"
        ))),
    }
}

impl FromStr for Color {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_color(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Alignment of a grid preset along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Middle,
    End,
}

/// One of the nine named grid anchors.
///
/// The Chinese labels used by older template files are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridPreset {
    #[serde(alias = "左上")]
    TopLeft,
    #[serde(alias = "上中")]
    TopCenter,
    #[serde(alias = "右上")]
    TopRight,
    #[serde(alias = "左中")]
    MidLeft,
    #[serde(alias = "中心")]
    Center,
    #[serde(alias = "右中")]
    MidRight,
    #[serde(alias = "左下")]
    BottomLeft,
    #[serde(alias = "下中")]
    BottomCenter,
    #[default]
    #[serde(alias = "右下")]
    BottomRight,
}

impl GridPreset {
    pub const ALL: [GridPreset; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::MidLeft,
        Self::Center,
        Self::MidRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::MidLeft => "mid-left",
            Self::Center => "center",
            Self::MidRight => "mid-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    pub fn horizontal(&self) -> Align {
        match self {
            Self::TopLeft | Self::MidLeft | Self::BottomLeft => Align::Start,
            Self::TopCenter | Self::Center | Self::BottomCenter => Align::Middle,
            Self::TopRight | Self::MidRight | Self::BottomRight => Align::End,
        }
    }

    pub fn vertical(&self) -> Align {
        match self {
            Self::TopLeft | Self::TopCenter | Self::TopRight => Align::Start,
            Self::MidLeft | Self::Center | Self::MidRight => Align::Middle,
            Self::BottomLeft | Self::BottomCenter | Self::BottomRight => Align::End,
        }
    }
}

impl fmt::Display for GridPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridPreset {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .or(match normalized.as_str() {
                "center-left" => Some(Self::MidLeft),
                "center-right" => Some(Self::MidRight),
                _ => None,
            })
            .ok_or_else(|| {
                WatermarkError::invalid(format!(
                    "Unknown grid position '{s}', expected one of: {}",
                    Self::ALL.map(|p| p.as_str()).join(", ")
                ))
            })
    }
}

/// Explicit top-left coordinate in base-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManualPoint {
    pub x: i32,
    pub y: i32,
}

impl ManualPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Where the watermark goes.
///
/// The grid preset is always remembered; a manual point, once set, wins over
/// it until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    preset: GridPreset,
    manual: Option<ManualPoint>,
}

impl Placement {
    pub fn grid(preset: GridPreset) -> Self {
        Self {
            preset,
            manual: None,
        }
    }

    pub fn manual(x: i32, y: i32) -> Self {
        Self {
            preset: GridPreset::default(),
            manual: Some(ManualPoint::new(x, y)),
        }
    }

    pub fn preset(&self) -> GridPreset {
        self.preset
    }

    pub fn manual_point(&self) -> Option<ManualPoint> {
        self.manual
    }

    pub fn is_manual(&self) -> bool {
        self.manual.is_some()
    }

    /// Replace the preset. A manual point, if set, keeps precedence.
    pub fn with_preset(self, preset: GridPreset) -> Self {
        Self { preset, ..self }
    }

    pub fn with_manual_point(self, x: i32, y: i32) -> Self {
        Self {
            manual: Some(ManualPoint::new(x, y)),
            ..self
        }
    }

    /// Drop the manual point so the preset applies again.
    pub fn cleared(self) -> Self {
        Self {
            manual: None,
            ..self
        }
    }
}

/// Whole-canvas rotation in degrees, counter-clockwise, within [0, 360].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RotationAngle(u16);

impl RotationAngle {
    pub fn new(degrees: i32) -> Result<Self, WatermarkError> {
        if !(0..=MAX_ANGLE as i32).contains(&degrees) {
            return Err(WatermarkError::invalid(format!(
                "Rotation angle must be within [0, {MAX_ANGLE}], got {degrees}"
            )));
        }
        Ok(Self(degrees as u16))
    }

    pub fn degrees(&self) -> u16 {
        self.0
    }

    /// 0 and 360 leave the canvas as it is.
    pub fn is_identity(&self) -> bool {
        self.0 % MAX_ANGLE == 0
    }
}

impl<'de> Deserialize<'de> for RotationAngle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let degrees = i32::deserialize(deserializer)?;
        Self::new(degrees).map_err(serde::de::Error::custom)
    }
}

/// Text watermark specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextSpec {
    content: String,
    font_size: u32,
    color: Color,
}

impl TextSpec {
    pub fn new(
        content: impl Into<String>,
        font_size: u32,
        color: Color,
    ) -> Result<Self, WatermarkError> {
        let content = content.into();
        if content.is_empty() {
            return Err(WatermarkError::invalid("Text watermark content cannot be empty"));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
            return Err(WatermarkError::invalid(format!(
                "Font size must be within [{MIN_FONT_SIZE}, {MAX_FONT_SIZE}], got {font_size}"
            )));
        }
        // one font_size cell per char must fit in a raster width
        let chars = content.chars().count() as u64;
        if chars * font_size as u64 > u32::MAX as u64 {
            return Err(WatermarkError::invalid(format!(
                "Text of {chars} characters is too long to render at size {font_size}"
            )));
        }
        Ok(Self {
            content,
            font_size,
            color,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// Image watermark specification.
///
/// `overlay` is the key the overlay store resolves (a file path for the
/// file-backed store). `scale` sizes the overlay relative to the base width.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    overlay: String,
    scale: f32,
}

impl ImageSpec {
    pub fn new(overlay: impl Into<String>, scale: f32) -> Result<Self, WatermarkError> {
        let overlay = overlay.into();
        if overlay.is_empty() {
            return Err(WatermarkError::invalid("Image watermark source cannot be empty"));
        }
        // NaN fails the range check
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(WatermarkError::invalid(format!(
                "Image watermark scale must be within (0, 1], got {scale}"
            )));
        }
        Ok(Self { overlay, scale })
    }

    pub fn overlay(&self) -> &str {
        &self.overlay
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// Borrowed view of one active watermark element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatermarkSpec<'a> {
    Text(&'a TextSpec),
    Image(&'a ImageSpec),
}

/// Complete, validated description of one watermark request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "ConfigurationRecord", try_from = "ConfigurationRecord")]
pub struct Configuration {
    text: Option<TextSpec>,
    image: Option<ImageSpec>,
    placement: Placement,
    angle: RotationAngle,
    name: Option<String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&TextSpec> {
        self.text.as_ref()
    }

    pub fn image(&self) -> Option<&ImageSpec> {
        self.image.as_ref()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn angle(&self) -> RotationAngle {
        self.angle
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_watermark(&self) -> bool {
        self.text.is_some() || self.image.is_some()
    }

    /// Active watermark elements in compositing order: text, then image.
    pub fn specs(&self) -> Vec<WatermarkSpec<'_>> {
        let mut specs = Vec::with_capacity(2);
        if let Some(text) = &self.text {
            specs.push(WatermarkSpec::Text(text));
        }
        if let Some(image) = &self.image {
            specs.push(WatermarkSpec::Image(image));
        }
        specs
    }

    pub fn with_text(self, text: TextSpec) -> Self {
        Self {
            text: Some(text),
            ..self
        }
    }

    pub fn without_text(self) -> Self {
        Self { text: None, ..self }
    }

    pub fn with_image(self, image: ImageSpec) -> Self {
        Self {
            image: Some(image),
            ..self
        }
    }

    pub fn without_image(self) -> Self {
        Self {
            image: None,
            ..self
        }
    }

    pub fn with_placement(self, placement: Placement) -> Self {
        Self { placement, ..self }
    }

    pub fn with_preset(self, preset: GridPreset) -> Self {
        let placement = self.placement.with_preset(preset);
        Self { placement, ..self }
    }

    pub fn with_manual_point(self, x: i32, y: i32) -> Self {
        let placement = self.placement.with_manual_point(x, y);
        Self { placement, ..self }
    }

    pub fn without_manual_point(self) -> Self {
        let placement = self.placement.cleared();
        Self { placement, ..self }
    }

    pub fn with_angle(self, angle: RotationAngle) -> Self {
        Self { angle, ..self }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn without_name(self) -> Self {
        Self { name: None, ..self }
    }
}

/// Persisted form of a [`Configuration`].
///
/// One entry of the template JSON file. Unset text, image and manual point
/// are stored as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    #[serde(default)]
    pub name: Option<String>,
    /// `[content, font_size, color]`
    #[serde(default)]
    pub watermark_text: Option<(String, u32, Color)>,
    #[serde(default)]
    pub watermark_position: GridPreset,
    #[serde(default)]
    pub watermark_angle: i32,
    #[serde(default)]
    pub watermark_image_path: Option<String>,
    #[serde(default = "default_scale")]
    pub watermark_image_scale: f32,
    #[serde(default)]
    pub watermark_xy: Option<(i32, i32)>,
}

impl From<Configuration> for ConfigurationRecord {
    fn from(config: Configuration) -> Self {
        let (watermark_image_path, watermark_image_scale) = match config.image {
            Some(image) => (Some(image.overlay), image.scale),
            None => (None, default_scale()),
        };

        Self {
            name: config.name,
            watermark_text: config
                .text
                .map(|text| (text.content, text.font_size, text.color)),
            watermark_position: config.placement.preset,
            watermark_angle: config.angle.degrees() as i32,
            watermark_image_path,
            watermark_image_scale,
            watermark_xy: config.placement.manual.map(|p| (p.x, p.y)),
        }
    }
}

impl TryFrom<ConfigurationRecord> for Configuration {
    type Error = WatermarkError;

    fn try_from(record: ConfigurationRecord) -> Result<Self, Self::Error> {
        let text = record
            .watermark_text
            .map(|(content, font_size, color)| TextSpec::new(content, font_size, color))
            .transpose()?;
        let image = record
            .watermark_image_path
            .map(|path| ImageSpec::new(path, record.watermark_image_scale))
            .transpose()?;

        let mut placement = Placement::grid(record.watermark_position);
        if let Some((x, y)) = record.watermark_xy {
            placement = placement.with_manual_point(x, y);
        }

        Ok(Self {
            text,
            image,
            placement,
            angle: RotationAngle::new(record.watermark_angle)?,
            name: record.name,
        })
    }
}
