// Photomark watermark compositing library

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod templates;
pub mod watermark;

pub use error::AppError;
pub use watermark::{Configuration, WatermarkEngine, WatermarkError};
