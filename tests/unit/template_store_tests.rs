// Template store persistence tests

use photomark::templates::{TemplateStore, TemplateStoreError};
use photomark::watermark::{Color, Configuration, GridPreset, ImageSpec, RotationAngle, TextSpec};

fn sample() -> Configuration {
    Configuration::new()
        .with_text(TextSpec::new("© Studio", 36, Color::rgba(255, 255, 255, 200)).unwrap())
        .with_image(ImageSpec::new("/assets/logo.png", 0.25).unwrap())
        .with_preset(GridPreset::BottomLeft)
        .with_manual_point(12, -4)
        .with_angle(RotationAngle::new(45).unwrap())
}

#[test]
fn test_missing_store_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::load(dir.path().join("templates.json"));
    assert!(store.is_empty());
    assert!(store.names().is_empty());
}

#[test]
fn test_corrupt_store_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        TemplateStore::try_load(&path),
        Err(TemplateStoreError::StoreUnreadable { .. })
    ));
    assert!(TemplateStore::load(&path).is_empty());
}

#[test]
fn test_save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");

    let mut store = TemplateStore::new(&path);
    store.insert("corner", sample()).unwrap();
    store.insert("plain", Configuration::new()).unwrap();
    store.save().unwrap();

    let reloaded = TemplateStore::load(&path);
    assert_eq!(reloaded.names(), vec!["corner", "plain"]);
    assert_eq!(reloaded.get("corner"), Some(&sample().with_name("corner")));
    assert_eq!(reloaded.get("plain").unwrap().text(), None);
}

#[test]
fn test_store_file_uses_record_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");

    let mut store = TemplateStore::new(&path);
    store.insert("corner", sample()).unwrap();
    store.save().unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let record = &json[0];
    assert_eq!(record["name"], "corner");
    assert_eq!(record["watermark_text"][0], "© Studio");
    assert_eq!(record["watermark_text"][1], 36);
    assert_eq!(record["watermark_position"], "bottom-left");
    assert_eq!(record["watermark_angle"], 45);
    assert_eq!(record["watermark_image_path"], "/assets/logo.png");
    assert_eq!(record["watermark_xy"][0], 12);
    assert_eq!(record["watermark_xy"][1], -4);
}

#[test]
fn test_invalid_records_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "ok", "watermark_angle": 90},
            {"name": "bad-angle", "watermark_angle": 720},
            {"watermark_angle": 10},
            {"name": "ok", "watermark_angle": 180}
        ]"#,
    )
    .unwrap();

    let store = TemplateStore::load(&path);
    assert_eq!(store.names(), vec!["ok"]);
    assert_eq!(store.get("ok").unwrap().angle().degrees(), 90);
}

#[test]
fn test_duplicate_and_blank_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::new(dir.path().join("templates.json"));

    store.insert("  logo  ", Configuration::new()).unwrap();
    assert!(store.contains("logo"));
    assert!(matches!(
        store.insert("logo", Configuration::new()),
        Err(TemplateStoreError::DuplicateTemplate(_))
    ));
    assert!(matches!(
        store.insert("   ", Configuration::new()),
        Err(TemplateStoreError::InvalidName(_))
    ));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_then_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");

    let mut store = TemplateStore::new(&path);
    store.insert("a", Configuration::new()).unwrap();
    store.insert("b", Configuration::new()).unwrap();
    store.save().unwrap();

    let removed = store.remove("a").unwrap();
    assert_eq!(removed.name(), Some("a"));
    assert!(matches!(
        store.remove("a"),
        Err(TemplateStoreError::NotFound(_))
    ));
    store.save().unwrap();

    assert_eq!(TemplateStore::load(&path).names(), vec!["b"]);
}

#[test]
fn test_save_to_unwritable_location_keeps_templates() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::new(dir.path().join("missing").join("templates.json"));
    store.insert("a", Configuration::new()).unwrap();

    assert!(matches!(
        store.save(),
        Err(TemplateStoreError::StoreUnwritable { .. })
    ));
    assert!(store.contains("a"));
}
