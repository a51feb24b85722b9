//! End-to-end fetch runs against an in-memory API

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use lapline_core::{HttpResponse, Pause, Transport, TransportError};
use lapline_fetch::{FetchConfig, FetchError, FetchOrchestrator};
use serde_json::json;

#[derive(Default)]
struct RecordingPause(RefCell<Vec<Duration>>);

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}

/// Fake race API: a declared total per season, optional scripted statuses.
#[derive(Default)]
struct FakeApi {
    totals: HashMap<i32, u64>,
    /// Statuses returned (in order) before serving `(season, offset)` normally
    hiccups: RefCell<HashMap<(i32, u64), Vec<u16>>>,
    requests: RefCell<Vec<(i32, u64)>>,
}

impl FakeApi {
    fn with_totals(totals: &[(i32, u64)]) -> Self {
        Self {
            totals: totals.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl Transport for FakeApi {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let season: i32 = url.rsplit('/').nth(1).unwrap().parse().unwrap();
        let param = |name: &str| -> u64 {
            query
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.parse().unwrap())
                .unwrap()
        };
        let (offset, limit) = (param("offset"), param("limit"));
        self.requests.borrow_mut().push((season, offset));

        if let Some(statuses) = self.hiccups.borrow_mut().get_mut(&(season, offset)) {
            if !statuses.is_empty() {
                return Ok(HttpResponse::new(statuses.remove(0), ""));
            }
        }

        let total = self.totals.get(&season).copied().unwrap_or(0);
        let races: Vec<_> = (offset..total.min(offset + limit))
            .map(|i| {
                json!({
                    "season": season.to_string(),
                    "round": (i / 20 + 1).to_string(),
                    "Circuit": {"circuitId": "bahrain"},
                    "Results": [{"position": ((i % 20) + 1).to_string(), "Driver": {"driverId": format!("d{i}")}}]
                })
            })
            .collect();
        let body = json!({
            "MRData": {
                "limit": limit.to_string(),
                "offset": offset.to_string(),
                "total": total.to_string(),
                "RaceTable": {"season": season.to_string(), "Races": races}
            }
        });
        Ok(HttpResponse::new(200, body.to_string()))
    }
}

fn config(raw_dir: &std::path::Path) -> FetchConfig {
    FetchConfig {
        base_url: "https://api.test/ergast/f1".to_string(),
        raw_dir: raw_dir.to_path_buf(),
        page_size: 30,
        ..Default::default()
    }
}

fn json_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(Result::ok).map(|e| e.path()).collect())
        .unwrap_or_default();
    files.retain(|p: &std::path::PathBuf| p.extension().is_some_and(|e| e == "json"));
    files.sort();
    files
}

#[test]
fn two_seasons_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with_totals(&[(2022, 45), (2023, 20)]);
    let orchestrator = FetchOrchestrator::new(&api, RecordingPause::default(), &config(dir.path()));

    let summary = orchestrator.run("results", &[2022, 2023]).unwrap();

    assert_eq!(summary.pages_persisted, 3);
    assert_eq!(summary.artifacts.len(), 3);
    assert_eq!(
        *api.requests.borrow(),
        vec![(2022, 0), (2022, 30), (2023, 0)]
    );
    assert_eq!(summary.seasons[0].season, 2022);
    assert_eq!(summary.seasons[0].pages, 2);
    assert_eq!(summary.seasons[0].total, Some(45));
    assert_eq!(summary.seasons[1].season, 2023);
    assert_eq!(summary.seasons[1].pages, 1);

    assert_eq!(json_files(&dir.path().join("results/2022")).len(), 2);
    assert_eq!(json_files(&dir.path().join("results/2023")).len(), 1);

    // Artifacts are written in offset order
    let first: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary.artifacts[0]).unwrap()).unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary.artifacts[1]).unwrap()).unwrap();
    assert_eq!(first["offset"], "0");
    assert_eq!(second["offset"], "30");
    assert_eq!(second["RaceTable"]["Races"].as_array().unwrap().len(), 15);
}

#[test]
fn empty_season_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with_totals(&[(2021, 0), (2022, 10)]);
    let orchestrator = FetchOrchestrator::new(&api, RecordingPause::default(), &config(dir.path()));

    let summary = orchestrator.run("results", &[2021, 2022]).unwrap();

    assert_eq!(summary.pages_persisted, 1);
    assert_eq!(summary.seasons[0].pages, 0);
    assert!(json_files(&dir.path().join("results/2021")).is_empty());
}

#[test]
fn rerun_adds_artifacts_without_overwriting() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with_totals(&[(2023, 20)]);
    let cfg = config(dir.path());

    let first = FetchOrchestrator::new(&api, RecordingPause::default(), &cfg)
        .run("results", &[2023])
        .unwrap();
    let second = FetchOrchestrator::new(&api, RecordingPause::default(), &cfg)
        .run("results", &[2023])
        .unwrap();

    assert_ne!(first.artifacts[0], second.artifacts[0]);
    assert_eq!(json_files(&dir.path().join("results/2023")).len(), 2);
}

#[test]
fn rate_limited_page_is_retried_then_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with_totals(&[(2023, 45)]);
    api.hiccups
        .borrow_mut()
        .insert((2023, 30), vec![429, 429, 429]);
    let orchestrator = FetchOrchestrator::new(&api, RecordingPause::default(), &config(dir.path()));

    let summary = orchestrator.run("results", &[2023]).unwrap();

    assert_eq!(summary.pages_persisted, 2);
    assert_eq!(api.requests.borrow().len(), 5);
    let pauses = orchestrator.paginator().fetcher().pause().0.borrow().clone();
    // one courtesy delay, then three fixed backoffs
    assert_eq!(pauses[0], Duration::from_millis(250));
    assert_eq!(&pauses[1..], &[Duration::from_secs(3); 3]);
}

#[test]
fn server_error_aborts_but_keeps_earlier_pages() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with_totals(&[(2022, 45), (2023, 20)]);
    api.hiccups.borrow_mut().insert((2022, 30), vec![500]);
    let orchestrator = FetchOrchestrator::new(&api, RecordingPause::default(), &config(dir.path()));

    let err = orchestrator.run("results", &[2022, 2023]).unwrap_err();

    assert!(matches!(err, FetchError::Request { status: 500, .. }));
    // season 2023 never visited
    assert_eq!(*api.requests.borrow(), vec![(2022, 0), (2022, 30)]);
    assert_eq!(json_files(&dir.path().join("results/2022")).len(), 1);
}
