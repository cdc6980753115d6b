// src/sheets/value.rs
use serde::Serialize;

use crate::extractors::numbers::{delocalize, parse_number};

/// The final value written to a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Normalizes text values; numbers pass through unchanged.
    pub fn normalize(self) -> CellValue {
        match self {
            CellValue::Number(n) => CellValue::Number(n),
            CellValue::Text(raw) => normalize_text(&raw),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Number(n) => serde_json::json!(n),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Converts an extracted string into its spreadsheet value.
///
/// A leading `'` is dropped (and the rest may still become a number), a fully
/// parenthesized value is negated, dots are removed and commas become the
/// decimal point. If the result does not parse, the cleaned text is kept.
pub fn normalize_text(raw: &str) -> CellValue {
    let mut value = raw.trim();
    if let Some(rest) = value.strip_prefix('\'') {
        value = rest;
    }

    let signed;
    if let Some(inner) = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        signed = format!("-{}", inner);
        value = &signed;
    }

    let cleaned = delocalize(value);
    match parse_number(cleaned.trim()) {
        Some(n) => CellValue::Number(n),
        None => CellValue::Text(cleaned),
    }
}
