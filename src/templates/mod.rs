//! Named watermark templates persisted as a JSON file.
//!
//! The store file is a JSON list of configuration records (see
//! [`ConfigurationRecord`](crate::watermark::ConfigurationRecord)). Loading
//! never fails: a missing or unparseable file yields an empty store, and
//! records that do not validate are skipped. Saving rewrites the whole file
//! through a temporary sibling so a crash never leaves a half-written store.

pub mod error;

pub use error::TemplateStoreError;

use crate::watermark::Configuration;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default store file name, relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = "watermark_templates.json";

/// Template names are compared without surrounding whitespace.
fn normalize_name(name: &str) -> &str {
    name.trim()
}

/// In-memory template collection bound to a store file.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
    /// Insertion order is kept; every entry has a unique name.
    templates: Vec<Configuration>,
}

impl TemplateStore {
    /// Empty store bound to `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            templates: Vec::new(),
        }
    }

    /// Load the store at `path`, starting empty when it cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Starting with empty template store");
                Self::new(path)
            }
        }
    }

    /// Load the store at `path`.
    ///
    /// A missing file is an empty store. Invalid or duplicate records are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// `StoreUnreadable` when the file exists but cannot be read or is not a
    /// JSON list.
    pub fn try_load(path: &Path) -> Result<Self, TemplateStoreError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Template store not found, starting empty");
                return Ok(Self::new(path));
            }
            Err(e) => {
                return Err(TemplateStoreError::StoreUnreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let records: Vec<serde_json::Value> =
            serde_json::from_str(&data).map_err(|e| TemplateStoreError::StoreUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut store = Self::new(path);
        let mut seen = HashSet::new();

        for (index, record) in records.into_iter().enumerate() {
            let config = match serde_json::from_value::<Configuration>(record) {
                Ok(config) => config,
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid template record");
                    continue;
                }
            };

            let name = config.name().map(normalize_name).unwrap_or_default();
            if name.is_empty() {
                warn!(index, "Skipping unnamed template record");
                continue;
            }
            let name = name.to_string();
            let config = config.with_name(name.as_str());

            if !seen.insert(name.clone()) {
                warn!(index, name = %name, "Skipping duplicate template record");
                continue;
            }
            store.templates.push(config);
        }

        info!(
            path = %path.display(),
            templates = store.templates.len(),
            "Loaded template store"
        );
        Ok(store)
    }

    /// Write every template to the store file.
    ///
    /// On failure the in-memory templates are untouched.
    pub fn save(&self) -> Result<(), TemplateStoreError> {
        let json = serde_json::to_string_pretty(&self.templates)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let unwritable = |source: std::io::Error| TemplateStoreError::StoreUnwritable {
            path: self.path.clone(),
            source,
        };

        std::fs::write(&tmp_path, json).map_err(unwritable)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(unwritable(e));
        }

        info!(
            path = %self.path.display(),
            templates = self.templates.len(),
            "Saved template store"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Configuration> {
        let name = normalize_name(name);
        self.templates.iter().find(|t| t.name() == Some(name))
    }

    /// Template names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().filter_map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.templates.iter()
    }

    /// Store `config` under `name`.
    ///
    /// Existing templates are never replaced; remove first to re-save a name.
    pub fn insert(&mut self, name: &str, config: Configuration) -> Result<(), TemplateStoreError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(TemplateStoreError::InvalidName(name.to_string()));
        }
        if self.contains(name) {
            return Err(TemplateStoreError::DuplicateTemplate(name.to_string()));
        }

        self.templates.push(config.with_name(name));
        debug!(name, "Added template");
        Ok(())
    }

    /// Remove and return the template called `name`.
    pub fn remove(&mut self, name: &str) -> Result<Configuration, TemplateStoreError> {
        let name = normalize_name(name);
        let index = self
            .templates
            .iter()
            .position(|t| t.name() == Some(name))
            .ok_or_else(|| TemplateStoreError::NotFound(name.to_string()))?;

        debug!(name, "Removed template");
        Ok(self.templates.remove(index))
    }
}
