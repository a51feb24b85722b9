//! Flat rows and the table they form

use serde_json::Value;

/// Columns every row carries, appended after the entity fields
pub const CONTEXT_COLUMNS: [&str; 3] = ["season", "round", "circuit"];

/// One nested entity (e.g. a driver result) flattened and tagged with its race.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub season: i32,
    pub round: u32,
    pub circuit: String,
    /// Dot-joined column name → leaf value, in source order
    pub fields: Vec<(String, Value)>,
}

impl FlatRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// Ordered rows; the column set is derived from the rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<FlatRecord>,
}

impl Table {
    pub fn new(rows: Vec<FlatRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field columns in first-seen order, then `season`, `round`, `circuit`.
    ///
    /// An entity field sharing a context column's name is shadowed by it.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for (name, _) in &row.fields {
                if !CONTEXT_COLUMNS.contains(&name.as_str()) && !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        columns.extend(CONTEXT_COLUMNS.iter().map(|c| c.to_string()));
        columns
    }
}

impl FromIterator<FlatRecord> for Table {
    fn from_iter<I: IntoIterator<Item = FlatRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
