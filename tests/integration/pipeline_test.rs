// End-to-end pipeline tests: files in, watermarked files out

use image::{Rgba, RgbaImage};
use photomark::batch::{render_all, BatchJob};
use photomark::config::AppConfig;
use photomark::session::Session;
use photomark::templates::TemplateStore;
use photomark::watermark::{
    Color, FontResolver, FsOverlayStore, GridPreset, ImageSpec, RotationAngle, TextSpec,
    WatermarkEngine,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn engine() -> WatermarkEngine {
    WatermarkEngine::new(
        Arc::new(FontResolver::builtin()),
        Arc::new(FsOverlayStore::new()),
    )
}

fn write_png(path: &Path, image: &RgbaImage) -> PathBuf {
    image.save(path).unwrap();
    path.to_path_buf()
}

fn app_config(dir: &Path) -> AppConfig {
    let yaml = format!(
        "templates:\n  path: {}\nexport:\n  prefix: \"wm_\"\n  suffix: \"\"\n",
        dir.join("templates.json").display()
    );
    AppConfig::from_yaml_with_env(&yaml).unwrap()
}

#[test]
fn test_session_export_with_file_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(
        &dir.path().join("photo.png"),
        &RgbaImage::from_pixel(400, 300, GREY),
    );
    let logo = write_png(
        &dir.path().join("logo.png"),
        &RgbaImage::from_pixel(80, 40, GREEN),
    );
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let app = app_config(dir.path());
    let mut session = Session::new(engine(), app.export.options().unwrap());
    assert_eq!(session.import([&source]), 1);
    session.select(0).unwrap();

    session.set_image(Some(
        ImageSpec::new(logo.to_string_lossy(), 0.2).unwrap(),
    ));
    session.set_preset(GridPreset::TopRight);

    let written = session
        .export(&out_dir, &app.export.prefix, &app.export.suffix)
        .unwrap();
    assert_eq!(written, out_dir.join("wm_photo.png"));

    // 400 * 0.2 = 80 wide, so the overlay is used at its own size
    let result = image::open(&written).unwrap().to_rgba8();
    assert_eq!(result.dimensions(), (400, 300));
    assert_eq!(result.get_pixel(320, 0), &GREEN);
    assert_eq!(result.get_pixel(399, 39), &GREEN);
    assert_eq!(result.get_pixel(319, 0), &GREY);
    assert_eq!(result.get_pixel(320, 40), &GREY);
}

#[test]
fn test_template_saved_in_one_session_applies_in_another() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_config(dir.path());
    let source = write_png(
        &dir.path().join("photo.png"),
        &RgbaImage::from_pixel(120, 80, GREY),
    );

    let mut store = TemplateStore::load(&app.templates.path);
    let mut first = Session::new(engine(), app.export.options().unwrap());
    first.set_text(Some(TextSpec::new("WM", 20, Color::white()).unwrap()));
    first.set_angle(RotationAngle::new(180).unwrap());
    first.begin_drag((0, 0));
    first.drag_to((15, 25));
    first.end_drag();
    first.save_template(&mut store, "stamp").unwrap();

    let store = TemplateStore::load(&app.templates.path);
    let mut second = Session::new(engine(), app.export.options().unwrap());
    second.import([&source]);
    second.select(0).unwrap();
    second.apply_template(&store, "stamp").unwrap();

    assert_eq!(second.configuration().name(), Some("stamp"));
    assert_eq!(
        second.configuration().text(),
        first.configuration().text()
    );
    assert_eq!(
        second.configuration().placement(),
        first.configuration().placement()
    );

    let rendered = second.render().unwrap();
    assert_eq!(rendered.dimensions(), (120, 80));
    assert!(second.apply_template(&store, "missing").is_err());
}

#[test]
fn test_batch_writes_every_image() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_config(dir.path());
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let sources: Vec<PathBuf> = (0..6)
        .map(|i| {
            write_png(
                &dir.path().join(format!("img{i}.png")),
                &RgbaImage::from_pixel(60 + i * 10, 40, GREY),
            )
        })
        .collect();
    let jpeg_source = dir.path().join("shot.jpg");
    image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, GREY))
        .to_rgb8()
        .save(&jpeg_source)
        .unwrap();

    let mut all = sources.clone();
    all.push(jpeg_source);

    let config = photomark::Configuration::new()
        .with_text(TextSpec::new("b", 10, Color::black()).unwrap())
        .with_preset(GridPreset::Center);
    let job = BatchJob {
        out_dir: out_dir.clone(),
        prefix: app.export.prefix.clone(),
        suffix: "_done".to_string(),
        export: app.export.options().unwrap(),
    };

    let outcomes = render_all(&engine(), &config, &all, &job);

    assert_eq!(outcomes.len(), 7);
    assert!(outcomes.iter().all(|o| o.is_ok()));
    for (i, source) in sources.iter().enumerate() {
        let written = out_dir.join(format!("wm_img{i}_done.png"));
        assert_eq!(outcomes[i].source, *source);
        let image = image::open(&written).unwrap();
        assert_eq!(image.width(), 60 + i as u32 * 10);
    }

    let jpeg = image::open(out_dir.join("wm_shot_done.jpg")).unwrap();
    assert_eq!(jpeg.color(), image::ColorType::Rgb8);
}

#[test]
fn test_missing_overlay_file_fails_render_only() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(
        &dir.path().join("photo.png"),
        &RgbaImage::from_pixel(50, 50, GREY),
    );

    let mut session = Session::new(engine(), Default::default());
    session.import([&source]);
    session.select(0).unwrap();
    session.set_image(Some(
        ImageSpec::new(dir.path().join("gone.png").to_string_lossy(), 0.5).unwrap(),
    ));

    assert!(matches!(
        session.render(),
        Err(photomark::WatermarkError::AssetUnavailable(_))
    ));
    // the session itself stays usable
    session.set_image(None);
    assert_eq!(session.render().unwrap(), session.original().unwrap().clone());
}

// Test: replacing the overlay file on disk changes the next render
#[test]
fn test_overlay_replaced_on_disk_between_renders() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    write_png(&logo, &RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));

    let engine = engine();
    let base = RgbaImage::from_pixel(50, 50, GREY);
    let config = photomark::Configuration::new()
        .with_image(ImageSpec::new(logo.to_string_lossy(), 0.2).unwrap())
        .with_preset(GridPreset::TopLeft);

    let first = engine.render(Some(&base), &config).unwrap();
    assert_eq!(first.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));

    write_png(&logo, &RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255])));
    let second = engine.render(Some(&base), &config).unwrap();
    assert_eq!(second.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
}
