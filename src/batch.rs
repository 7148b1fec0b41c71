//! Parallel batch rendering.
//!
//! Each source image runs through its own independent load, render and export
//! pipeline on the rayon thread pool. Only the engine (fonts, overlay cache)
//! and the read-only configuration are shared.

use crate::error::AppError;
use crate::export::{destination_path, save, ExportOptions};
use crate::session::load_rgba;
use crate::watermark::{Configuration, WatermarkEngine};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Where and how batch output is written.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub out_dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    pub export: ExportOptions,
}

/// Result for one source image.
#[derive(Debug)]
pub struct BatchOutcome {
    pub source: PathBuf,
    pub result: Result<PathBuf, AppError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn process_one(
    engine: &WatermarkEngine,
    config: &Configuration,
    job: &BatchJob,
    source: &Path,
) -> Result<PathBuf, AppError> {
    let destination = destination_path(&job.out_dir, source, &job.prefix, &job.suffix)
        .ok_or_else(|| AppError::ImageLoad {
            path: source.to_path_buf(),
            message: "source has no file name".to_string(),
        })?;

    let base = load_rgba(source)?;
    let rendered = engine.render(Some(&base), config)?;
    save(&rendered, &destination, &job.export)?;
    Ok(destination)
}

/// Render `config` onto every source in parallel.
///
/// Failures are reported per image; one bad file does not stop the batch.
/// Outcomes are returned in the order of `sources`.
pub fn render_all(
    engine: &WatermarkEngine,
    config: &Configuration,
    sources: &[PathBuf],
    job: &BatchJob,
) -> Vec<BatchOutcome> {
    let started = Instant::now();

    let outcomes: Vec<BatchOutcome> = sources
        .par_iter()
        .map(|source| {
            let result = process_one(engine, config, job, source);
            if let Err(e) = &result {
                warn!(source = %source.display(), error = %e, "Batch item failed");
            }
            BatchOutcome {
                source: source.clone(),
                result,
            }
        })
        .collect();

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(
        total = outcomes.len(),
        succeeded,
        failed = outcomes.len() - succeeded,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch finished"
    );
    outcomes
}
