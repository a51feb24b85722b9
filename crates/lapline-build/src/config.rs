use std::path::PathBuf;

use crate::consolidate::DEFAULT_IDENTITY_COLUMN;

/// Configuration for the build pipeline.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the raw artifact store written by the fetcher
    pub raw_dir: PathBuf,
    /// Root for consolidated tables (`<output_dir>/<endpoint>/<endpoint>.csv`)
    pub output_dir: PathBuf,
    /// Endpoint whose artifacts are consolidated (e.g. "results")
    pub endpoint: String,
    /// Per-race list to flatten (e.g. "Results", "QualifyingResults")
    pub key: String,
    /// Flattened column identifying an entity within a race
    pub identity_column: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/intermediate"),
            endpoint: "results".to_string(),
            key: "Results".to_string(),
            identity_column: DEFAULT_IDENTITY_COLUMN.to_string(),
        }
    }
}
