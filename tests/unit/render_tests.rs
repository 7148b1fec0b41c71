// Rendering tests against the public engine API

use image::{Rgba, RgbaImage};
use photomark::watermark::{
    resolve, Color, Configuration, FontResolver, GridPreset, ImageDimensions, ImageSpec,
    MemoryOverlayStore, RotationAngle, TextSpec, WatermarkDimensions, WatermarkEngine,
    WatermarkError, WatermarkSpec,
};
use std::sync::Arc;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn engine(store: MemoryOverlayStore) -> WatermarkEngine {
    WatermarkEngine::new(Arc::new(FontResolver::builtin()), Arc::new(store))
}

fn white(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}

fn logo_store() -> MemoryOverlayStore {
    MemoryOverlayStore::new().with_overlay("logo.png", RgbaImage::from_pixel(200, 100, RED))
}

#[test]
fn test_bottom_right_text_touches_both_edges() {
    let engine = engine(MemoryOverlayStore::new());
    let text = TextSpec::new("TEST", 40, Color::black()).unwrap();
    let config = Configuration::new()
        .with_text(text.clone())
        .with_preset(GridPreset::BottomRight);

    let patch = engine.render_patch(WatermarkSpec::Text(&text), 500).unwrap();
    let canvas = ImageDimensions {
        width: 500,
        height: 400,
    };
    let anchor = resolve(
        &canvas,
        &WatermarkDimensions::of(&patch.image),
        &config.placement(),
    );

    // Test: the patch box ends exactly at the right and bottom edges
    assert_eq!(anchor.x + patch.image.width() as i32, 500);
    assert_eq!(anchor.y + patch.image.height() as i32, 400);

    let rendered = engine.render(Some(&white(500, 400)), &config).unwrap();
    assert_eq!(rendered.dimensions(), (500, 400));
    for (x, y, pixel) in rendered.enumerate_pixels() {
        let inside = x as i32 >= anchor.x && y as i32 >= anchor.y;
        if !inside {
            assert_eq!(pixel, &WHITE, "pixel ({x}, {y}) outside the patch changed");
        }
    }
    assert!(rendered.pixels().any(|p| p != &WHITE));
}

#[test]
fn test_overlay_scaled_against_base_width() {
    let engine = engine(logo_store());
    let spec = ImageSpec::new("logo.png", 0.2).unwrap();

    let patch = engine.render_patch(WatermarkSpec::Image(&spec), 500).unwrap();
    assert_eq!(patch.image.dimensions(), (100, 50));

    let config = Configuration::new()
        .with_image(spec)
        .with_preset(GridPreset::BottomRight);
    let rendered = engine.render(Some(&white(500, 400)), &config).unwrap();

    assert_eq!(rendered.get_pixel(400, 350), &RED);
    assert_eq!(rendered.get_pixel(499, 399), &RED);
    assert_eq!(rendered.get_pixel(399, 350), &WHITE);
    assert_eq!(rendered.get_pixel(400, 349), &WHITE);
}

#[test]
fn test_manual_point_left_of_canvas_is_clipped() {
    let engine = engine(logo_store());
    let config = Configuration::new()
        .with_image(ImageSpec::new("logo.png", 0.2).unwrap())
        .with_manual_point(-50, 10);

    let rendered = engine.render(Some(&white(500, 400)), &config).unwrap();

    // 100x50 patch at x=-50: only its right half lands on the canvas
    assert_eq!(rendered.get_pixel(0, 10), &RED);
    assert_eq!(rendered.get_pixel(49, 59), &RED);
    assert_eq!(rendered.get_pixel(50, 10), &WHITE);
    assert_eq!(rendered.get_pixel(0, 60), &WHITE);
    assert_eq!(rendered.get_pixel(0, 9), &WHITE);
}

#[test]
fn test_image_is_drawn_over_text() {
    let engine = engine(logo_store());
    let config = Configuration::new()
        .with_image(ImageSpec::new("logo.png", 0.2).unwrap())
        .with_text(TextSpec::new("A", 40, Color::black()).unwrap())
        .with_preset(GridPreset::TopLeft);

    let rendered = engine.render(Some(&white(500, 400)), &config).unwrap();

    for y in 0..50 {
        for x in 0..100 {
            assert_eq!(rendered.get_pixel(x, y), &RED);
        }
    }
}

#[test]
fn test_semi_transparent_text_blends() {
    let engine = engine(MemoryOverlayStore::new());
    let config = Configuration::new()
        .with_text(TextSpec::new("A", 16, Color::rgba(0, 0, 0, 128)).unwrap())
        .with_preset(GridPreset::TopLeft);

    let rendered = engine.render(Some(&white(64, 32)), &config).unwrap();

    // 'A' has ink in its first glyph row at column 2 (pixels 4..6 at size 16)
    assert_eq!(rendered.get_pixel(4, 0), &Rgba([127, 127, 127, 255]));
    assert_eq!(rendered.get_pixel(0, 0), &WHITE);
}

#[test]
fn test_render_is_idempotent_and_leaves_base_alone() {
    let engine = engine(logo_store());
    let base = white(300, 200);
    let config = Configuration::new()
        .with_text(TextSpec::new("Hi", 20, Color::new(0, 0, 255)).unwrap())
        .with_image(ImageSpec::new("logo.png", 0.5).unwrap())
        .with_preset(GridPreset::Center)
        .with_angle(RotationAngle::new(33).unwrap());

    let first = engine.render(Some(&base), &config).unwrap();
    let second = engine.render(Some(&base), &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(base, white(300, 200));
}

#[test]
fn test_rotation_applies_to_whole_canvas() {
    let engine = engine(MemoryOverlayStore::new());
    let config = Configuration::new()
        .with_text(TextSpec::new("X", 10, Color::black()).unwrap())
        .with_angle(RotationAngle::new(90).unwrap());

    let rendered = engine.render(Some(&white(500, 400)), &config).unwrap();
    assert_eq!(rendered.dimensions(), (400, 500));
}

#[test]
fn test_render_errors() {
    let engine = engine(MemoryOverlayStore::new());

    assert_eq!(
        engine.render(None, &Configuration::new()).unwrap_err(),
        WatermarkError::NoSourceImage
    );
    assert_eq!(
        engine.render_bytes(&[], &Configuration::new()).unwrap_err(),
        WatermarkError::NoSourceImage
    );

    let config = Configuration::new().with_image(ImageSpec::new("nope.png", 0.2).unwrap());
    let err = engine.render(Some(&white(10, 10)), &config).unwrap_err();
    assert!(matches!(err, WatermarkError::AssetUnavailable(_)));
}

#[test]
fn test_invalid_values_are_rejected_at_construction() {
    assert!(TextSpec::new("", 40, Color::white()).is_err());
    assert!(TextSpec::new("a", 9, Color::white()).is_err());
    assert!(TextSpec::new("a", 201, Color::white()).is_err());
    assert!(ImageSpec::new("logo.png", 0.0).is_err());
    assert!(ImageSpec::new("logo.png", 1.5).is_err());
    assert!(ImageSpec::new("logo.png", f32::NAN).is_err());
    assert!(RotationAngle::new(-1).is_err());
    assert!(RotationAngle::new(361).is_err());
    assert!(ImageSpec::new("logo.png", 1.0).is_ok());
}
