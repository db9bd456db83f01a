//! Catalog source records: ordered column → value maps read from CSV.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// One raw catalog row. Column order is preserved so metadata
/// pass-through keeps the source ordering.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Map::new();
        for (k, v) in pairs {
            fields.insert(k.into(), Value::String(v.into()));
        }
        Self { fields }
    }

    /// Non-empty string value of a column; empty and null-ish markers
    /// count as missing.
    pub fn get(&self, column: &str) -> Option<&str> {
        let value = self.fields.get(column)?.as_str()?.trim();
        if value.is_empty() || matches!(value.to_lowercase().as_str(), "none" | "null" | "nan") {
            return None;
        }
        Some(value)
    }

    /// First present column out of several candidates.
    pub fn first_of(&self, columns: &[&str]) -> Option<&str> {
        columns.iter().find_map(|c| self.get(c))
    }
}

/// Read a whole CSV file into records keyed by its header row.
pub fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut fields = Map::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            fields.insert(header.to_string(), Value::String(value.to_string()));
        }
        records.push(RawRecord { fields });
    }
    Ok(records)
}
