//! Conversion of raw spreadsheet cells into clean numeric values
//!
//! Cells arrive either as native numbers (unformatted render) or as display
//! strings in Brazilian locale format ("R$ 1.234,56", "5,40%"). Formula
//! failures show up as strings with a leading `#` ("#N/A", "#REF!").
//!
//! Every failure path resolves to `None`; nothing here returns an error.

use serde_json::Value;

/// Currency token stripped from display strings
pub const CURRENCY_TOKEN: &str = "R$";

/// Prefix used by the spreadsheet for formula errors
pub const ERROR_MARKER: char = '#';

/// A single raw cell value as delivered by a data source
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form of the cell, used for label columns such as `Mes`
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Empty => None,
        }
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
            Value::String(s) => CellValue::Text(s.clone()),
            // Arrays/objects never appear in a values range; keep their text
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Normalize one cell into a finite number, or `None` when it is missing
/// or cannot be recovered.
pub fn normalize(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Text(s) => normalize_str(s),
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

/// Normalize a locale-formatted display string.
///
/// Separator policy:
/// - both `.` and `,` present: `.` is the thousands separator, `,` the decimal
/// - only `,` present: it is the decimal separator
/// - only `.` present: the string is parsed as-is
pub fn normalize_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with(ERROR_MARKER) {
        return None;
    }

    // Whitespace goes first so a split token like "R $" is still recognized
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = compact.replace(CURRENCY_TOKEN, "").replace('%', "");

    if cleaned.is_empty() {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let canonical = if has_dot && has_comma {
        cleaned.replace('.', "").replace(',', ".")
    } else if has_comma {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };

    canonical
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
