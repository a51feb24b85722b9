//! Main runner for the fetch pipeline

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lapline_core::{HttpTransport, Pause, SharedProgress, ThreadPause, Transport, fmt_num};

use crate::api::{FetchError, PageFetcher};
use crate::config::FetchConfig;
use crate::paginate::SeasonPaginator;
use crate::persist::PagePersistor;

/// Pages persisted for one season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonSummary {
    pub season: i32,
    pub pages: usize,
    /// Last declared total, if the API sent one
    pub total: Option<u64>,
}

/// Pipeline execution summary
#[derive(Debug)]
pub struct FetchSummary {
    pub pages_persisted: usize,
    pub seasons: Vec<SeasonSummary>,
    /// Artifact paths in write order
    pub artifacts: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Walks seasons in order and persists each page as it arrives.
pub struct FetchOrchestrator<T, P = ThreadPause> {
    paginator: SeasonPaginator<T, P>,
    persistor: PagePersistor,
    base_url: String,
    page_size: u64,
    progress: Option<SharedProgress>,
}

impl FetchOrchestrator<HttpTransport, ThreadPause> {
    /// Orchestrator talking to the real API
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(HttpTransport, ThreadPause, config)
    }
}

impl<T: Transport, P: Pause> FetchOrchestrator<T, P> {
    pub fn new(transport: T, pause: P, config: &FetchConfig) -> Self {
        let fetcher = PageFetcher::new(transport, pause, config);
        Self {
            paginator: SeasonPaginator::new(fetcher, config),
            persistor: PagePersistor::new(&config.raw_dir),
            base_url: config.base_url.clone(),
            page_size: config.page_size,
            progress: None,
        }
    }

    /// Show a spinner line per season
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn paginator(&self) -> &SeasonPaginator<T, P> {
        &self.paginator
    }

    /// Fetch every page of every season.
    ///
    /// Stops at the first error; artifacts already written stay on disk.
    pub fn run(&self, endpoint: &str, seasons: &[i32]) -> Result<FetchSummary, FetchError> {
        let start = Instant::now();
        let mut artifacts = Vec::new();
        let mut season_summaries = Vec::with_capacity(seasons.len());

        for &season in seasons {
            log::info!("Fetching {endpoint} for season: {season}");
            let line = self
                .progress
                .as_ref()
                .map(|p| p.stage_line(&season.to_string()));

            let mut summary = SeasonSummary {
                season,
                pages: 0,
                total: None,
            };
            for page in self.paginator.paginate(endpoint, season, self.page_size)? {
                let page = page?;
                let offset = page.offset;
                summary.total = page.total.or(summary.total);
                if let Some(pb) = &line {
                    pb.set_message(format!(
                        "{endpoint} offset {offset}/{}",
                        summary.total.map_or("?".to_string(), |t| t.to_string())
                    ));
                }

                let path = self.persistor.persist(page)?;
                log::debug!("{endpoint} {season} offset={offset} -> {}", path.display());
                artifacts.push(path);
                summary.pages += 1;
            }

            if let Some(pb) = line {
                pb.finish_and_clear();
            }
            log::info!(
                "Season {season}: {} pages (total={})",
                summary.pages,
                summary.total.map_or("?".to_string(), |t| t.to_string())
            );
            season_summaries.push(summary);
        }

        Ok(FetchSummary {
            pages_persisted: artifacts.len(),
            seasons: season_summaries,
            artifacts,
            elapsed: start.elapsed(),
        })
    }
}

/// Run the fetch pipeline against the configured API
pub fn run(config: &FetchConfig, endpoint: &str, seasons: &[i32]) -> Result<FetchSummary> {
    run_with(FetchOrchestrator::from_config(config), endpoint, seasons)
}

/// Run with a prepared orchestrator (custom transport or progress)
pub fn run_with<T: Transport, P: Pause>(
    orchestrator: FetchOrchestrator<T, P>,
    endpoint: &str,
    seasons: &[i32],
) -> Result<FetchSummary> {
    anyhow::ensure!(!endpoint.trim().is_empty(), "Endpoint must not be empty");
    anyhow::ensure!(!seasons.is_empty(), "No seasons to fetch");

    log::info!(
        "Fetching {endpoint} for {} season(s) from {} (page size {})",
        seasons.len(),
        orchestrator.base_url,
        orchestrator.page_size
    );

    let summary = orchestrator
        .run(endpoint, seasons)
        .with_context(|| format!("Fetch of '{endpoint}' aborted"))?;

    log::info!("=== Fetch Summary ===");
    for s in &summary.seasons {
        log::info!("Season {}: {} pages", s.season, s.pages);
    }
    log::info!("Pages persisted: {}", fmt_num(summary.pages_persisted));
    log::info!("Output: {}", orchestrator.persistor.root().display());
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}
