//! Fetch into a scratch store, then build the table from it

use std::path::Path;
use std::time::Duration;

use lapline_build::{BuildConfig, BuildError};
use lapline_core::{HttpResponse, Pause, Transport, TransportError};
use lapline_fetch::{FetchConfig, FetchOrchestrator};
use serde_json::json;

struct NoPause;

impl Pause for NoPause {
    fn pause(&self, _duration: Duration) {}
}

/// Two races per season, three drivers each; serves every race on one page.
struct TwoRaceApi;

impl Transport for TwoRaceApi {
    fn get(&self, url: &str, _query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let season = url.rsplit('/').nth(1).unwrap().to_string();
        let races: Vec<_> = [("2", "monza"), ("1", "bahrain")]
            .iter()
            .map(|(round, circuit)| {
                let results: Vec<_> = ["max_verstappen", "perez", "alonso"]
                    .iter()
                    .enumerate()
                    .map(|(i, d)| {
                        json!({
                            "position": (i + 1).to_string(),
                            "Driver": {"driverId": d, "nationality": "n/a"},
                            "Constructor": {"constructorId": "team"}
                        })
                    })
                    .collect();
                json!({
                    "season": season,
                    "round": round,
                    "Circuit": {"circuitId": circuit},
                    "Results": results
                })
            })
            .collect();
        let body = json!({"MRData": {"total": "6", "RaceTable": {"season": season, "Races": races}}});
        Ok(HttpResponse::new(200, body.to_string()))
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fetch(raw_dir: &Path, seasons: &[i32]) {
    let config = FetchConfig {
        raw_dir: raw_dir.to_path_buf(),
        page_size: 30,
        ..Default::default()
    };
    FetchOrchestrator::new(TwoRaceApi, NoPause, &config)
        .run("results", seasons)
        .unwrap();
}

fn build_config(raw_dir: &Path, output_dir: &Path) -> BuildConfig {
    BuildConfig {
        raw_dir: raw_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn repeated_fetches_consolidate_to_one_row_per_driver() {
    init_logging();
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    fetch(raw.path(), &[2023, 2022]);
    fetch(raw.path(), &[2023]);

    let summary = lapline_build::run(&build_config(raw.path(), out.path())).unwrap();

    assert_eq!(summary.artifacts, 3);
    assert_eq!(summary.rows_read, 18);
    assert_eq!(summary.rows_written, 12);
    assert_eq!(summary.output, out.path().join("results").join("results.csv"));

    let mut reader = csv::Reader::from_path(&summary.output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "position",
            "Driver.driverId",
            "Driver.nationality",
            "Constructor.constructorId",
            "season",
            "round",
            "circuit"
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 12);
    let order: Vec<(String, String)> = rows
        .iter()
        .map(|r| (r[4].to_string(), r[5].to_string()))
        .collect();
    // season then round ascending
    assert_eq!(order[0], ("2022".to_string(), "1".to_string()));
    assert_eq!(order[3], ("2022".to_string(), "2".to_string()));
    assert_eq!(order[6], ("2023".to_string(), "1".to_string()));
    assert_eq!(order[11], ("2023".to_string(), "2".to_string()));
    assert_eq!(&rows[0][6], "bahrain");
    assert_eq!(&rows[3][6], "monza");
}

#[test]
fn build_is_stable_across_reruns() {
    init_logging();
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fetch(raw.path(), &[2023]);

    let config = build_config(raw.path(), out.path());
    let first = lapline_build::run(&config).unwrap();
    let first_csv = std::fs::read_to_string(&first.output).unwrap();

    fetch(raw.path(), &[2023]);
    let second = lapline_build::run(&config).unwrap();
    let second_csv = std::fs::read_to_string(&second.output).unwrap();

    assert_eq!(first.rows_written, second.rows_written);
    assert_eq!(first_csv, second_csv);
}

#[test]
fn corrupt_artifact_fails_build_without_output() {
    init_logging();
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fetch(raw.path(), &[2023]);
    std::fs::write(
        raw.path().join("results/2023/results_corrupt.json"),
        r#"{"total": "6", "RaceTable": {"Races": [{"season": "2023"}]}}"#,
    )
    .unwrap();

    let err = lapline_build::run(&build_config(raw.path(), out.path())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::SchemaMismatch { .. })
    ));
    assert!(!out.path().join("results").exists());
}

#[test]
fn unknown_endpoint_has_no_artifacts() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = BuildConfig {
        endpoint: "qualifying".to_string(),
        ..build_config(raw.path(), out.path())
    };
    let err = lapline_build::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::NoArtifacts { .. })
    ));
}
