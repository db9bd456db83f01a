//! Metadata pass-through with dotted-key nesting.
//!
//! Source catalogs carry arbitrary columns like
//! `tags.visual.color.primary`; those nest into JSON objects. A dotted
//! path that collides with an existing non-object value falls back to
//! the flat column name instead of clobbering it.

use serde_json::{Map, Value};

use crate::source::RawRecord;

/// Columns consumed by the pipeline itself and excluded from the bag.
const EXCLUDED: &[&str] = &[
    "price",
    "lowest_price",
    "cost",
    "selling_price",
    "brand",
    "brand_name",
    "manufacturer",
    "currency",
    "image_url",
    "product_name",
    "description",
];

pub fn collect_metadata(record: &RawRecord, mapped_columns: &[&str]) -> Map<String, Value> {
    let mut metadata = Map::new();
    for column in record.fields.keys() {
        if EXCLUDED.contains(&column.as_str()) || mapped_columns.contains(&column.as_str()) {
            continue;
        }
        let Some(text) = record.get(column) else {
            continue;
        };
        insert_nested(&mut metadata, column, Value::String(text.to_string()));
    }
    metadata
}

pub fn insert_nested(metadata: &mut Map<String, Value>, key: &str, value: Value) {
    if !key.contains('.') {
        metadata.insert(key.to_string(), value);
        return;
    }
    let parts: Vec<&str> = key.split('.').collect();
    if !path_is_nestable(metadata, &parts[..parts.len() - 1]) {
        metadata.insert(key.to_string(), value);
        return;
    }
    let mut current = metadata;
    for part in &parts[..parts.len() - 1] {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry.as_object_mut() {
            Some(obj) => current = obj,
            // path_is_nestable ruled this out
            None => return,
        }
    }
    if let Some(last) = parts.last() {
        current.insert((*last).to_string(), value);
    }
}

/// True when every existing key along `path` is an object, so the
/// nested insert will not clobber a scalar.
fn path_is_nestable(metadata: &Map<String, Value>, path: &[&str]) -> bool {
    let mut current = metadata;
    for part in path {
        match current.get(*part) {
            None => return true,
            Some(Value::Object(obj)) => current = obj,
            Some(_) => return false,
        }
    }
    true
}
