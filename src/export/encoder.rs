//! Encoders for rendered watermark output.
//!
//! - One [`ImageEncoder`] per [`OutputFormat`], picked by [`EncoderFactory`]
//! - A single quality knob, honoured by the lossy formats only
//! - Flattening onto an opaque background for formats without alpha

use super::format::OutputFormat;
use crate::watermark::{blend_pixels, Color, WatermarkError};
use image::{ColorType, ImageEncoder as _, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// Encoder quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality). Only lossy formats
    /// use it.
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

impl EncoderQuality {
    /// Quality clamped to 1-100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Encoded bytes plus the format they are in.
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat) -> Self {
        let content_type = format.content_type();
        Self {
            data,
            format,
            content_type,
        }
    }
}

/// Encodes an RGBA raster to one output format.
///
/// Object-safe; the factory hands encoders out as `Box<dyn ImageEncoder>`.
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// # Errors
    ///
    /// `EncodeFailed` when the codec rejects the image.
    fn encode(
        &self,
        image: &RgbaImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError>;

    /// Whether alpha survives encoding.
    fn supports_transparency(&self) -> bool;
}

/// JPEG encoder. Transparent pixels are composited onto `background`.
pub struct JpegEncoder {
    pub background: Color,
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self {
            background: Color::white(),
        }
    }
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(
        &self,
        image: &RgbaImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;

        // JPEG has no alpha channel
        let rgb = flatten(image, self.background);

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, quality.quality);

        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Jpeg))
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// Lossless PNG, alpha kept.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(
        &self,
        image: &RgbaImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
            .map_err(|e| WatermarkError::encode_failed("png", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Png))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Lossless WebP; quality is ignored.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(
        &self,
        image: &RgbaImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;

        let mut output = Cursor::new(Vec::new());
        ImageWebPEncoder::new_lossless(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
            .map_err(|e| WatermarkError::encode_failed("webp", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::WebP))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// GIF encoder (palette quantised, single frame)
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(
        &self,
        image: &RgbaImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::gif::GifEncoder as ImageGifEncoder;

        let mut output = Vec::new();
        {
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
                .map_err(|e| WatermarkError::encode_failed("gif", e.to_string()))?;
        }

        Ok(EncodedImage::new(output, OutputFormat::Gif))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// BMP encoder using the image crate
pub struct BmpEncoder;

impl ImageEncoder for BmpEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Bmp
    }

    fn encode(
        &self,
        image: &RgbaImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::bmp::BmpEncoder as ImageBmpEncoder;

        let mut output = Vec::new();
        ImageBmpEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
            .map_err(|e| WatermarkError::encode_failed("bmp", e.to_string()))?;

        Ok(EncodedImage::new(output, OutputFormat::Bmp))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// TIFF encoder using the image crate
pub struct TiffEncoder;

impl ImageEncoder for TiffEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Tiff
    }

    fn encode(
        &self,
        image: &RgbaImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::tiff::TiffEncoder as ImageTiffEncoder;

        let mut output = Cursor::new(Vec::new());
        ImageTiffEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
            .map_err(|e| WatermarkError::encode_failed("tiff", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Tiff))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Maps an output format to its encoder.
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the specified output format.
    ///
    /// `background` is only used by formats without transparency.
    pub fn create(format: OutputFormat, background: Color) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder { background }),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
            OutputFormat::Gif => Box::new(GifEncoder),
            OutputFormat::Bmp => Box::new(BmpEncoder),
            OutputFormat::Tiff => Box::new(TiffEncoder),
        }
    }
}

/// Composite `image` onto an opaque `background` and drop the alpha channel.
pub fn flatten(image: &RgbaImage, background: Color) -> RgbImage {
    let backdrop = Color {
        a: 255,
        ..background
    }
    .to_rgba();

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = blend_pixels(backdrop, *image.get_pixel(x, y));
        Rgb([pixel[0], pixel[1], pixel[2]])
    })
}
