//! lapline-build: consolidate persisted pages into one table
//!
//! Reads every raw JSON page of an endpoint, flattens the per-race
//! entity lists into rows, sorts and dedups them, and writes a CSV.

mod config;
pub mod consolidate;
pub mod error;
pub mod export;
pub mod flatten;
pub mod table;

pub use config::BuildConfig;
pub use consolidate::consolidate;
pub use error::BuildError;
pub use table::{FlatRecord, Table};

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Summary statistics from a build.
#[derive(Debug)]
pub struct BuildSummary {
    pub artifacts: usize,
    pub rows_read: usize,
    pub rows_written: usize,
    pub columns: usize,
    pub output: PathBuf,
}

/// Run the build pipeline.
pub fn run(config: &BuildConfig) -> Result<BuildSummary> {
    log::info!(
        "Building {} from {} (key: {})",
        config.endpoint,
        config.raw_dir.display(),
        config.key
    );

    let paths = flatten::list_artifacts(&config.raw_dir, &config.endpoint)
        .with_context(|| format!("Failed to list artifacts for '{}'", config.endpoint))?;
    log::info!("Found {} artifacts", paths.len());

    let table = flatten::flatten_artifacts(&paths, &config.key)
        .with_context(|| format!("Failed to flatten '{}'", config.endpoint))?;
    let rows_read = table.len();
    log::info!("Flattened {rows_read} rows");

    let table = consolidate(table, &config.identity_column);
    let columns = table.columns().len();

    let output = export::write_csv(&table, &config.output_dir, &config.endpoint)
        .context("Failed to export table")?;

    log::info!(
        "Build complete: {} rows ({} duplicates dropped), {} columns",
        table.len(),
        rows_read - table.len(),
        columns
    );

    Ok(BuildSummary {
        artifacts: paths.len(),
        rows_read,
        rows_written: table.len(),
        columns,
        output,
    })
}
