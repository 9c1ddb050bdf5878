//! The typed-row vocabulary ingestion speaks before a row is bound to a
//! canonical or staging schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single cell value as it arrives from a pluggable source (CSV,
/// spreadsheet, JSON array). Sources never hand us Rust-native numeric
/// types directly — everything is parsed and range-checked by the
/// Validator's schema stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// One row of a typed row stream, with column names already normalized
/// (trimmed, lowercased, spaces replaced with underscores) by the
/// source adapter before it reaches the Batch Lifecycle Manager.
pub type RawRow = BTreeMap<String, CellValue>;
