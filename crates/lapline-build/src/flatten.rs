//! Persisted pages → flat rows

use std::path::{Path, PathBuf};

use lapline_core::layout;
use serde_json::{Map, Value};

use crate::error::BuildError;
use crate::table::{FlatRecord, Table};

/// Every `*.json` artifact under `<raw_root>/<endpoint>/`, any depth, sorted.
pub fn list_artifacts(raw_root: &Path, endpoint: &str) -> Result<Vec<PathBuf>, BuildError> {
    let dir = layout::endpoint_dir(raw_root, endpoint);
    if !dir.is_dir() {
        return Err(BuildError::NoArtifacts { dir });
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        layout::ARTIFACT_EXT
    );
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| {
        BuildError::io(&dir, std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            BuildError::io(&path, e.into())
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(BuildError::NoArtifacts { dir });
    }
    paths.sort();
    Ok(paths)
}

/// Flatten every artifact of `endpoint`, concatenated in path order.
pub fn flatten(raw_root: &Path, endpoint: &str, key: &str) -> Result<Table, BuildError> {
    let paths = list_artifacts(raw_root, endpoint)?;
    flatten_artifacts(&paths, key)
}

pub fn flatten_artifacts(paths: &[PathBuf], key: &str) -> Result<Table, BuildError> {
    let mut rows = Vec::new();
    for path in paths {
        let before = rows.len();
        flatten_artifact(path, key, &mut rows)?;
        log::debug!("{}: {} rows", path.display(), rows.len() - before);
    }
    Ok(Table::new(rows))
}

/// Append the rows of one artifact to `out`.
pub fn flatten_artifact(path: &Path, key: &str, out: &mut Vec<FlatRecord>) -> Result<(), BuildError> {
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| BuildError::mismatch(path, format!("invalid JSON: {e}")))?;
    flatten_document(path, &document, key, out)
}

/// `RaceTable.Races[*].<key>[*]` → rows tagged with season, round, circuit
pub fn flatten_document(
    path: &Path,
    document: &Value,
    key: &str,
    out: &mut Vec<FlatRecord>,
) -> Result<(), BuildError> {
    let races = document
        .get("RaceTable")
        .and_then(|t| t.get("Races"))
        .and_then(Value::as_array)
        .ok_or_else(|| BuildError::mismatch(path, "no 'RaceTable.Races' list"))?;

    for (idx, race) in races.iter().enumerate() {
        let season = race
            .get("season")
            .and_then(as_int)
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| BuildError::mismatch(path, format!("race #{idx}: bad or missing 'season'")))?;
        let round = race
            .get("round")
            .and_then(as_int)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| BuildError::mismatch(path, format!("race #{idx}: bad or missing 'round'")))?;
        let circuit = race
            .get("Circuit")
            .and_then(|c| c.get("circuitId"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BuildError::mismatch(path, format!("race {season}/{round}: no 'Circuit.circuitId'"))
            })?;
        let entries = race.get(key).and_then(Value::as_array).ok_or_else(|| {
            BuildError::mismatch(path, format!("race {season}/{round}: no '{key}' list"))
        })?;

        for entry in entries {
            let Value::Object(map) = entry else {
                return Err(BuildError::mismatch(
                    path,
                    format!("race {season}/{round}: '{key}' entry is not an object"),
                ));
            };
            let mut fields = Vec::new();
            flatten_object("", map, &mut fields);
            out.push(FlatRecord {
                season,
                round,
                circuit: circuit.to_string(),
                fields,
            });
        }
    }
    Ok(())
}

/// The API sends numbers as strings; accept both.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Nested objects become dot-joined columns; arrays and scalars are leaves.
fn flatten_object(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (name, value) in map {
        let column = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_object(&column, inner, out),
            leaf => out.push((column, leaf.clone())),
        }
    }
}
