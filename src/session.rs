//! Interactive editing session.
//!
//! A [`Session`] holds the caller-side state of an editing workflow: the
//! imported source files, the selected image's pristine pixels, the current
//! [`Configuration`] and an in-progress drag gesture. Every change replaces
//! the configuration value; rendering always starts again from the original
//! pixels, so nothing drawn earlier can leak into a later render.

use crate::error::AppError;
use crate::export::{destination_path, save, ExportOptions};
use crate::templates::{TemplateStore, TemplateStoreError};
use crate::watermark::{
    Configuration, GridPreset, ImageSpec, RotationAngle, TextSpec, WatermarkEngine,
    WatermarkError,
};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pointer position in base-image pixels.
pub type Pointer = (i32, i32);

#[derive(Debug)]
pub struct Session {
    engine: WatermarkEngine,
    export: ExportOptions,
    images: Vec<PathBuf>,
    selected: Option<usize>,
    original: Option<RgbaImage>,
    config: Configuration,
    /// Pointer minus manual point at drag start.
    drag_offset: Option<(i32, i32)>,
}

impl Session {
    pub fn new(engine: WatermarkEngine, export: ExportOptions) -> Self {
        Self {
            engine,
            export,
            images: Vec::new(),
            selected: None,
            original: None,
            config: Configuration::default(),
            drag_offset: None,
        }
    }

    /// Add source files. Paths that do not exist are skipped.
    ///
    /// Returns the number of files added.
    pub fn import<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let before = self.images.len();
        for path in paths {
            let path = path.into();
            if path.is_file() {
                self.images.push(path);
            } else {
                warn!(path = %path.display(), "Skipping missing source image");
            }
        }
        let added = self.images.len() - before;
        debug!(added, total = self.images.len(), "Imported source images");
        added
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// Load the image at `index` as the new pristine original.
    pub fn select(&mut self, index: usize) -> Result<(), AppError> {
        let path = self.images.get(index).ok_or_else(|| AppError::ImageLoad {
            path: PathBuf::new(),
            message: format!("no imported image at index {index}"),
        })?;

        let original = load_rgba(path)?;
        info!(
            path = %path.display(),
            width = original.width(),
            height = original.height(),
            "Selected source image"
        );

        self.original = Some(original);
        self.selected = Some(index);
        self.drag_offset = None;
        Ok(())
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.selected
            .and_then(|index| self.images.get(index))
            .map(PathBuf::as_path)
    }

    pub fn original(&self) -> Option<&RgbaImage> {
        self.original.as_ref()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn set_configuration(&mut self, config: Configuration) {
        self.config = config;
    }

    fn update(&mut self, change: impl FnOnce(Configuration) -> Configuration) {
        let current = std::mem::take(&mut self.config);
        self.config = change(current);
    }

    pub fn set_text(&mut self, text: Option<TextSpec>) {
        self.update(|c| match text {
            Some(text) => c.with_text(text),
            None => c.without_text(),
        });
    }

    pub fn set_image(&mut self, image: Option<ImageSpec>) {
        self.update(|c| match image {
            Some(image) => c.with_image(image),
            None => c.without_image(),
        });
    }

    /// Select a grid preset. A manual point set earlier still wins.
    pub fn set_preset(&mut self, preset: GridPreset) {
        self.update(|c| c.with_preset(preset));
    }

    pub fn set_angle(&mut self, angle: RotationAngle) {
        self.update(|c| c.with_angle(angle));
    }

    pub fn clear_manual_point(&mut self) {
        self.update(Configuration::without_manual_point);
    }

    /// Start a drag at `pointer`.
    pub fn begin_drag(&mut self, pointer: Pointer) {
        let offset = match self.config.placement().manual_point() {
            Some(point) => (pointer.0 - point.x, pointer.1 - point.y),
            None => (0, 0),
        };
        self.drag_offset = Some(offset);
    }

    /// Move the watermark so it follows `pointer`. Ignored outside a drag.
    pub fn drag_to(&mut self, pointer: Pointer) {
        if let Some((dx, dy)) = self.drag_offset {
            self.update(|c| c.with_manual_point(pointer.0 - dx, pointer.1 - dy));
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_offset = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_offset.is_some()
    }

    /// Replace the configuration with the stored template `name`.
    pub fn apply_template(&mut self, store: &TemplateStore, name: &str) -> Result<(), AppError> {
        let template = store
            .get(name)
            .ok_or_else(|| TemplateStoreError::NotFound(name.to_string()))?;
        self.config = template.clone();
        debug!(name, "Applied template");
        Ok(())
    }

    /// Store the current configuration as `name` and persist the store.
    ///
    /// If writing fails the template stays in `store`.
    pub fn save_template(&self, store: &mut TemplateStore, name: &str) -> Result<(), AppError> {
        store.insert(name, self.config.clone())?;
        store.save()?;
        Ok(())
    }

    /// Render the current configuration onto the selected original.
    pub fn render(&self) -> Result<RgbaImage, WatermarkError> {
        self.engine.render(self.original.as_ref(), &self.config)
    }

    /// Render and write the result into `dir` as `prefix + stem + suffix + ext`.
    pub fn export(&self, dir: &Path, prefix: &str, suffix: &str) -> Result<PathBuf, AppError> {
        let source = self.selected_path().ok_or(WatermarkError::NoSourceImage)?;
        let destination = destination_path(dir, source, prefix, suffix).ok_or_else(|| {
            AppError::ImageLoad {
                path: source.to_path_buf(),
                message: "source has no file name".to_string(),
            }
        })?;

        let rendered = self.render()?;
        save(&rendered, &destination, &self.export)?;
        Ok(destination)
    }
}

/// Open an image file as RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, AppError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|e| AppError::ImageLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
