//! Coercer - converts raw CSV cells into typed record values
//!
//! Coercion never fails. Bad input is reported by the validator before this
//! runs; here every cell gets a best-effort value so rows accepted with
//! warnings still import.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use super::mapping::{FieldMapping, FieldShape, MappingSet};
use crate::entities::Record;

/// Accepted spellings for boolean cells (compared lowercase)
pub const BOOLEAN_WORDS: [&str; 6] = ["true", "false", "1", "0", "yes", "no"];
const TRUE_WORDS: [&str; 3] = ["true", "1", "yes"];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a finite number
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse a recognised boolean word
pub fn parse_bool(cell: &str) -> Option<bool> {
    let lower = cell.trim().to_lowercase();
    if BOOLEAN_WORDS.contains(&lower.as_str()) {
        Some(TRUE_WORDS.contains(&lower.as_str()))
    } else {
        None
    }
}

/// Parse a calendar date from the common date and timestamp spellings
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
        })
}

/// Format a date the way records store it
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Convert one cell according to its declared shape
pub fn coerce_cell(cell: Option<&str>, shape: FieldShape, today: NaiveDate) -> Value {
    let cell = cell.unwrap_or("");
    match shape {
        FieldShape::String => Value::String(cell.to_string()),
        FieldShape::Number => number_value(parse_number(cell).unwrap_or(0.0)),
        FieldShape::Boolean => {
            Value::Bool(TRUE_WORDS.contains(&cell.trim().to_lowercase().as_str()))
        }
        FieldShape::StringList => Value::Array(
            cell.split(';')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        FieldShape::Date => Value::String(format_date(parse_date(cell).unwrap_or(today))),
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or_else(|| Value::from(0))
    }
}

/// Builds candidate records from table rows for one mapping set
///
/// Column positions are resolved once; fields without a column (or whose
/// column is absent from the headers) are left out of every candidate.
pub struct Coercer<'a> {
    columns: Vec<(&'a FieldMapping, usize)>,
    today: NaiveDate,
}

impl<'a> Coercer<'a> {
    pub fn new(headers: &[String], mapping: &'a MappingSet, today: NaiveDate) -> Self {
        let columns = mapping
            .entries()
            .iter()
            .filter_map(|entry| {
                let column = entry.column.as_deref()?;
                let idx = headers.iter().position(|h| h == column)?;
                Some((entry, idx))
            })
            .collect();

        Self { columns, today }
    }

    pub fn coerce(&self, row: &[String]) -> Record {
        self.columns
            .iter()
            .map(|(entry, idx)| {
                let cell = row.get(*idx).map(String::as_str);
                (entry.field.clone(), coerce_cell(cell, entry.shape, self.today))
            })
            .collect()
    }
}
