//! Fetch pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

use lapline_core::RetryPolicy;

/// Public Ergast-compatible mirror
pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Seasons fetched when none are given
pub const DEFAULT_SEASONS: [i32; 4] = [2022, 2023, 2024, 2025];

/// Runtime configuration for the fetch pipeline
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// API root; requests go to `{base_url}/{season}/{endpoint}`
    pub base_url: String,
    /// Top-level field holding the payload (and its `total`)
    pub envelope: String,
    /// Root of the raw artifact store
    pub raw_dir: PathBuf,
    /// Records per page (`limit` query parameter)
    pub page_size: u64,
    /// Offset at which a season stops when the envelope has no usable `total`
    pub fallback_offset_cap: u64,
    /// Courtesy pause between pages
    pub page_delay: Duration,
    /// Rate-limit retry budget
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            envelope: "MRData".to_string(),
            raw_dir: PathBuf::from("data/raw"),
            page_size: 30,
            fallback_offset_cap: 30,
            page_delay: Duration::from_millis(250),
            retry: RetryPolicy::default(),
        }
    }
}
