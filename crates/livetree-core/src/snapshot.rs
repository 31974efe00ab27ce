//! Snapshot values and value presentation helpers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::Segment;

/// Immutable root value received from the feed.
///
/// Cloning shares the underlying value; a new poll result replaces the
/// whole snapshot instead of mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Arc<Value>);

impl Snapshot {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    /// Value shown before the first successful poll.
    pub fn placeholder() -> Self {
        Self::new(serde_json::json!([{ "status": null }]))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Returns true if both handles point at the same received value.
    pub fn same(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::placeholder()
    }
}

pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Own keys of a container in document order. Scalars have none.
pub fn own_entries(value: &Value) -> Vec<(Segment, &Value)> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| (Segment::Key(key.clone()), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, child)| (Segment::Index(index), child))
            .collect(),
        _ => Vec::new(),
    }
}

/// Runtime type of a scalar, used to pick its presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    String,
    Number,
    Bool(bool),
    Null,
}

pub fn leaf_kind(value: &Value) -> Option<LeafKind> {
    match value {
        Value::String(_) => Some(LeafKind::String),
        Value::Number(_) => Some(LeafKind::Number),
        Value::Bool(b) => Some(LeafKind::Bool(*b)),
        Value::Null => Some(LeafKind::Null),
        Value::Object(_) | Value::Array(_) => None,
    }
}

/// Display text for a scalar.
///
/// Non-integral numbers are fixed to three decimals. Containers fall back
/// to compact JSON.
pub fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() != 0.0 => format!("{f:.3}"),
                    Some(f) => format!("{f}"),
                    None => n.to_string(),
                }
            }
        }
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Null => "null".to_string(),
        Value::Object(_) | Value::Array(_) => compact(value),
    }
}

/// Single-line JSON form of a value.
pub fn compact(value: &Value) -> String {
    value.to_string()
}

/// Size summary of a container, e.g. `{3}` or `[2]`.
pub fn summary(value: &Value) -> String {
    match value {
        Value::Object(map) => format!("{{{}}}", map.len()),
        Value::Array(items) => format!("[{}]", items.len()),
        _ => String::new(),
    }
}

/// Text format used when copying a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CopyFormat {
    #[default]
    Json,
    Yaml,
}

impl fmt::Display for CopyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyFormat::Json => f.write_str("json"),
            CopyFormat::Yaml => f.write_str("yaml"),
        }
    }
}

/// Human-readable text of a subtree for the clipboard.
pub fn format_copy(value: &Value, format: CopyFormat) -> String {
    match format {
        CopyFormat::Json => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_err| compact(value))
        }
        CopyFormat::Yaml => serde_yaml::to_string(value).unwrap_or_else(|_err| compact(value)),
    }
}
