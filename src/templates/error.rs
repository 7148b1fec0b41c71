//! Error types for template store operations

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateStoreError {
    #[error("Template store unreadable: {}: {message}", .path.display())]
    StoreUnreadable { path: PathBuf, message: String },

    #[error("Template store unwritable: {}: {source}", .path.display())]
    StoreUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template '{0}' already exists")]
    DuplicateTemplate(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template name: {0:?}")]
    InvalidName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
