// Export format and file writing tests

use image::{ColorType, Rgba, RgbaImage};
use photomark::export::{destination_path, encode, save, ExportOptions, OutputFormat};
use photomark::watermark::Color;
use std::path::Path;

fn half_transparent() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
    for y in 0..16 {
        for x in 8..16 {
            image.put_pixel(x, y, Rgba([0, 0, 255, 255]));
        }
    }
    image
}

#[test]
fn test_jpeg_has_no_alpha_and_flattens_onto_white() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jpg");

    let format = save(&half_transparent(), &path, &ExportOptions::default()).unwrap();
    assert_eq!(format, OutputFormat::Jpeg);

    let decoded = image::open(&path).unwrap();
    assert_eq!(decoded.color(), ColorType::Rgb8);

    let rgb = decoded.to_rgb8();
    let corner = rgb.get_pixel(0, 0);
    assert!(corner.0.iter().all(|&c| c >= 250), "{corner:?}");
}

#[test]
fn test_jpeg_background_is_configurable() {
    let options = ExportOptions {
        background: Color::black(),
        ..ExportOptions::default()
    };
    let encoded = encode(&half_transparent(), OutputFormat::Jpeg, &options).unwrap();

    let rgb = image::load_from_memory(&encoded.data).unwrap().to_rgb8();
    let corner = rgb.get_pixel(0, 0);
    assert!(corner.0.iter().all(|&c| c <= 5), "{corner:?}");
}

#[test]
fn test_png_keeps_alpha_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    let image = half_transparent();

    save(&image, &path, &ExportOptions::default()).unwrap();

    let decoded = image::open(&path).unwrap();
    assert_eq!(decoded.color(), ColorType::Rgba8);
    assert_eq!(decoded.to_rgba8(), image);
}

#[test]
fn test_unknown_extension_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xyz");

    let format = save(&half_transparent(), &path, &ExportOptions::default()).unwrap();
    assert_eq!(format, OutputFormat::Png);

    let data = std::fs::read(&path).unwrap();
    assert_eq!(
        image::guess_format(&data).unwrap(),
        image::ImageFormat::Png
    );
}

#[test]
fn test_every_format_encodes() {
    let image = half_transparent();
    let formats = [
        (OutputFormat::Jpeg, image::ImageFormat::Jpeg),
        (OutputFormat::Png, image::ImageFormat::Png),
        (OutputFormat::WebP, image::ImageFormat::WebP),
        (OutputFormat::Gif, image::ImageFormat::Gif),
        (OutputFormat::Bmp, image::ImageFormat::Bmp),
        (OutputFormat::Tiff, image::ImageFormat::Tiff),
    ];

    for (format, expected) in formats {
        let encoded = encode(&image, format, &ExportOptions::default()).unwrap();
        assert_eq!(encoded.format, format);
        assert_eq!(encoded.content_type, format.content_type());
        assert_eq!(image::guess_format(&encoded.data).unwrap(), expected);
    }
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.png");

    let err = save(&half_transparent(), &path, &ExportOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        photomark::WatermarkError::EncodeFailed { .. }
    ));
}

#[test]
fn test_destination_path_composition() {
    let dest = destination_path(
        Path::new("/out"),
        Path::new("/photos/IMG_001.jpeg"),
        "wm_",
        "_final",
    );
    assert_eq!(
        dest.as_deref(),
        Some(Path::new("/out/wm_IMG_001_final.jpeg"))
    );
}
