//! Lapline Fetch - paginated race-data fetch pipeline
//!
//! Walks `{base}/{season}/{endpoint}` page by page for each configured
//! season and writes every page to its own timestamped JSON file.
//!
//! # Example
//!
//! ```ignore
//! use lapline_fetch::{FetchConfig, run};
//!
//! let config = FetchConfig {
//!     raw_dir: "data/raw".into(),
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, "results", &[2023])?;
//! println!("Persisted {} pages", summary.pages_persisted);
//! ```

pub mod api;
pub mod config;
pub mod paginate;
pub mod persist;
pub mod runner;

// Re-exports
pub use api::{FetchError, FetchRequest, FetchedPage, PageFetcher};
pub use config::FetchConfig;
pub use paginate::{SeasonPages, SeasonPaginator};
pub use persist::PagePersistor;
pub use runner::{FetchOrchestrator, FetchSummary, SeasonSummary, run, run_with};
