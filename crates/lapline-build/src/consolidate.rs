//! Sort by race, drop repeated entities

use std::collections::HashSet;

use serde_json::Value;

use crate::table::{FlatRecord, Table};

/// Entity column used for dedup when none is configured
pub const DEFAULT_IDENTITY_COLUMN: &str = "Driver.driverId";

#[derive(Debug, PartialEq, Eq, Hash)]
enum Identity {
    Entity(String),
    /// Non-string identity value, compared as JSON text
    EntityJson(String),
    /// Row without the identity column: the whole row is the identity
    Content(String),
}

fn identity(row: &FlatRecord, column: &str) -> Identity {
    match row.get(column) {
        Some(Value::String(s)) => Identity::Entity(s.clone()),
        Some(other) => Identity::EntityJson(other.to_string()),
        None => {
            let fields: Vec<Value> = row
                .fields
                .iter()
                .map(|(name, value)| Value::Array(vec![Value::String(name.clone()), value.clone()]))
                .collect();
            Identity::Content(format!("{}|{}", row.circuit, Value::Array(fields)))
        }
    }
}

/// Stable sort by `(season, round)`, then keep the first row per
/// `(season, round, identity)`.
///
/// Idempotent: a consolidated table comes back unchanged.
pub fn consolidate(table: Table, identity_column: &str) -> Table {
    let mut rows = table.rows;
    rows.sort_by_key(|row| (row.season, row.round));

    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert((row.season, row.round, identity(row, identity_column))));

    let dropped = before - rows.len();
    if dropped > 0 {
        log::info!("Dropped {dropped} duplicate rows (key: season, round, {identity_column})");
    }
    Table::new(rows)
}
