//! Table → delimited text with a header row

use std::path::{Path, PathBuf};

use lapline_core::layout;
use serde_json::Value;

use crate::error::BuildError;
use crate::table::{FlatRecord, Table};

/// Cell text: strings raw, null empty, containers as compact JSON
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn record(row: &FlatRecord, field_columns: &[String]) -> Vec<String> {
    let mut out: Vec<String> = field_columns.iter().map(|c| cell(row.get(c))).collect();
    out.push(row.season.to_string());
    out.push(row.round.to_string());
    out.push(row.circuit.clone());
    out
}

/// Write `table` to any sink.
pub fn write_table<W: std::io::Write>(table: &Table, sink: W) -> Result<(), csv::Error> {
    let columns = table.columns();
    // The last three are always season, round, circuit
    let field_columns = &columns[..columns.len() - 3];

    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(&columns)?;
    for row in &table.rows {
        writer.write_record(record(row, field_columns))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `<output_root>/<endpoint>/<endpoint>.csv`, replacing any previous export.
pub fn write_csv(table: &Table, output_root: &Path, endpoint: &str) -> Result<PathBuf, BuildError> {
    let path = layout::table_path(output_root, endpoint);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
    }

    let tmp = layout::tmp_path(&path);
    let file = std::fs::File::create(&tmp).map_err(|e| BuildError::io(&tmp, e))?;
    if let Err(e) = write_table(table, std::io::BufWriter::new(file)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(BuildError::io(&tmp, e.into()));
    }
    std::fs::rename(&tmp, &path).map_err(|e| BuildError::io(&path, e))?;

    log::info!("Data saved to: {}", path.display());
    Ok(path)
}
