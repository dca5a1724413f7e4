//! Exporter - filters an in-memory record collection and serializes it
//!
//! Filters compose with AND, in this order: free-text search, category
//! allowlist, publication state, date range. Spreadsheet output is CSV
//! content under a spreadsheet extension and MIME type.

use chrono::NaiveDate;
use clap::ValueEnum;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use super::coercer::{format_date, parse_date};
use crate::entities::{Record, RecordType};

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("There is no data available to export")]
    #[diagnostic(
        code(vct::export::no_data),
        help("loosen the --search, --category, --status or date filters")
    )]
    NoData,

    #[error("failed to serialize export: {0}")]
    #[diagnostic(code(vct::export::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// Output format of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    #[value(alias = "excel", alias = "xlsx")]
    #[serde(alias = "excel")]
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// Publication state, derived from a record's `isPublished` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Published,
    Draft,
}

impl PublishState {
    pub fn of(record: &Record) -> Self {
        match record.get("isPublished") {
            Some(Value::Bool(true)) => PublishState::Published,
            _ => PublishState::Draft,
        }
    }
}

/// Inclusive date bounds; an open side is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilters {
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub states: Vec<PublishState>,
    pub dates: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Keys to project, in order; empty means every key of the first record
    pub columns: Vec<String>,
    pub filters: ExportFilters,
    pub include_headers: bool,
    pub filename: Option<String>,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            columns: Vec::new(),
            filters: ExportFilters::default(),
            include_headers: true,
            filename: None,
        }
    }
}

/// A rendered export, ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub record_count: usize,
}

/// Apply the request's filters, keeping record order
pub fn filter_records<'r>(records: &'r [Record], filters: &ExportFilters) -> Vec<&'r Record> {
    let search = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    records
        .iter()
        .filter(|record| match &search {
            Some(needle) => Value::Object((*record).clone())
                .to_string()
                .to_lowercase()
                .contains(needle.as_str()),
            None => true,
        })
        .filter(|record| {
            filters.categories.is_empty()
                || record
                    .get("category")
                    .and_then(Value::as_str)
                    .is_some_and(|c| filters.categories.iter().any(|allowed| allowed == c))
        })
        .filter(|record| filters.states.is_empty() || filters.states.contains(&PublishState::of(record)))
        .filter(|record| {
            filters.dates.is_open() || record_date(record).is_some_and(|d| filters.dates.contains(d))
        })
        .collect()
}

/// Creation date of a record, falling back to its `date` field
fn record_date(record: &Record) -> Option<NaiveDate> {
    ["createdAt", "date"]
        .iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .and_then(parse_date)
}

/// Default filename: `{record-type plural}-{date}.{ext}`
pub fn default_filename(record_type: RecordType, format: ExportFormat, today: NaiveDate) -> String {
    format!(
        "{}-{}.{}",
        record_type.plural(),
        format_date(today),
        format.extension()
    )
}

/// Filter, project and serialize `records`
pub fn export(
    records: &[Record],
    record_type: RecordType,
    request: &ExportRequest,
    today: NaiveDate,
) -> Result<ExportOutput, ExportError> {
    let selected = filter_records(records, &request.filters);
    debug!(
        record_type = %record_type,
        total = records.len(),
        selected = selected.len(),
        "filtered records for export"
    );
    if selected.is_empty() {
        return Err(ExportError::NoData);
    }

    let columns: Vec<String> = if request.columns.is_empty() {
        selected[0].keys().cloned().collect()
    } else {
        request.columns.clone()
    };

    let content = match request.format {
        ExportFormat::Csv | ExportFormat::Spreadsheet => {
            render_csv(&selected, &columns, request.include_headers)
        }
        ExportFormat::Json => render_json(&selected, &request.columns)?,
    };

    Ok(ExportOutput {
        filename: request
            .filename
            .clone()
            .unwrap_or_else(|| default_filename(record_type, request.format, today)),
        content_type: request.format.content_type(),
        bytes: content.into_bytes(),
        record_count: selected.len(),
    })
}

fn render_csv(records: &[&Record], columns: &[String], include_headers: bool) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    if include_headers {
        lines.push(
            columns
                .iter()
                .map(|c| escape_field(c))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    for record in records {
        lines.push(
            columns
                .iter()
                .map(|c| escape_field(&cell_text(record.get(c))))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Records as a pretty-printed array; with columns, only the requested keys present on each
fn render_json(records: &[&Record], columns: &[String]) -> Result<String, ExportError> {
    let projected: Vec<Value> = records
        .iter()
        .map(|record| {
            if columns.is_empty() {
                return Value::Object((*record).clone());
            }
            Value::Object(
                columns
                    .iter()
                    .filter_map(|c| record.get(c).map(|v| (c.clone(), v.clone())))
                    .collect(),
            )
        })
        .collect();
    Ok(serde_json::to_string_pretty(&projected)?)
}

/// Text of one CSV cell: lists joined with `; `, objects as JSON
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell_text(Some(item)))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
    }
}

/// Quote a field containing a comma, quote or newline, doubling embedded quotes
pub fn escape_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::parse;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn docs() -> Vec<Record> {
        vec![
            record(json!({
                "id": "d1", "title": "Getting Started", "category": "tutorial",
                "isPublished": true, "createdAt": "2024-01-10", "tags": ["intro", "basics"]
            })),
            record(json!({
                "id": "d2", "title": "Pool Rates", "category": "gacha",
                "isPublished": false, "createdAt": "2024-03-05", "tags": []
            })),
            record(json!({
                "id": "d3", "title": "Festival Guide", "category": "tutorial",
                "isPublished": false, "createdAt": "2024-05-20", "tags": ["event"]
            })),
        ]
    }

    fn text(output: &ExportOutput) -> &str {
        std::str::from_utf8(&output.bytes).unwrap()
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("simple"), "simple");
        assert_eq!(escape_field("with,comma"), "\"with,comma\"");
        assert_eq!(escape_field("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_all_columns_from_first_record() {
        let request = ExportRequest::default();
        let output = export(&docs()[..1], RecordType::Document, &request, today()).unwrap();
        assert_eq!(
            text(&output),
            "id,title,category,isPublished,createdAt,tags\n\
             d1,Getting Started,tutorial,true,2024-01-10,intro; basics"
        );
        assert_eq!(output.filename, "documents-2024-06-01.csv");
        assert_eq!(output.content_type, "text/csv");
        assert_eq!(output.record_count, 1);
    }

    #[test]
    fn test_column_projection_only_name() {
        let items = vec![
            record(json!({"id": "s1", "name": "Ring", "price": 100})),
            record(json!({"id": "s2", "name": "Hat", "price": 5})),
        ];
        let request = ExportRequest {
            columns: vec!["name".into()],
            ..Default::default()
        };
        let output = export(&items, RecordType::ShopItem, &request, today()).unwrap();
        assert_eq!(text(&output), "name\nRing\nHat");
    }

    #[test]
    fn test_comma_cell_round_trips_through_parse() {
        let items = vec![record(json!({"name": "a,b", "note": "plain"}))];
        let output = export(&items, RecordType::Event, &ExportRequest::default(), today()).unwrap();
        assert_eq!(text(&output), "name,note\n\"a,b\",plain");

        let table = parse(text(&output)).unwrap();
        assert_eq!(table.rows()[0][0], "a,b");
        assert!(table.issues().is_empty());
    }

    #[test]
    fn test_objects_are_json_then_quoted() {
        let items = vec![record(json!({"version": "v1", "metrics": {"bugReports": 0}}))];
        let output = export(&items, RecordType::UpdateLog, &ExportRequest::default(), today()).unwrap();
        assert_eq!(
            text(&output),
            "version,metrics\nv1,\"{\"\"bugReports\"\":0}\""
        );
    }

    #[test]
    fn test_missing_keys_are_blank_cells() {
        let request = ExportRequest {
            columns: vec!["title".into(), "author".into()],
            ..Default::default()
        };
        let output = export(&docs()[..1], RecordType::Document, &request, today()).unwrap();
        assert_eq!(text(&output), "title,author\nGetting Started,");
    }

    #[test]
    fn test_without_headers() {
        let request = ExportRequest {
            columns: vec!["id".into()],
            include_headers: false,
            ..Default::default()
        };
        let output = export(&docs(), RecordType::Document, &request, today()).unwrap();
        assert_eq!(text(&output), "d1\nd2\nd3");
    }

    #[test]
    fn test_json_projection() {
        let request = ExportRequest {
            format: ExportFormat::Json,
            columns: vec!["title".into(), "author".into()],
            ..Default::default()
        };
        let output = export(&docs()[..1], RecordType::Document, &request, today()).unwrap();
        assert_eq!(text(&output), "[\n  {\n    \"title\": \"Getting Started\"\n  }\n]");
        assert_eq!(output.filename, "documents-2024-06-01.json");
        assert_eq!(output.content_type, "application/json");
    }

    #[test]
    fn test_spreadsheet_is_csv_with_xlsx_name() {
        let request = ExportRequest {
            format: ExportFormat::Spreadsheet,
            columns: vec!["id".into()],
            ..Default::default()
        };
        let output = export(&docs()[..1], RecordType::Document, &request, today()).unwrap();
        assert_eq!(text(&output), "id\nd1");
        assert!(output.filename.ends_with(".xlsx"));
        assert!(output.content_type.contains("spreadsheetml"));
    }

    #[test]
    fn test_filename_override() {
        let request = ExportRequest {
            filename: Some("backup.csv".into()),
            ..Default::default()
        };
        let output = export(&docs(), RecordType::Document, &request, today()).unwrap();
        assert_eq!(output.filename, "backup.csv");
    }

    #[test]
    fn test_search_is_case_insensitive_over_whole_record() {
        let filters = ExportFilters {
            search: Some("BASICS".into()),
            ..Default::default()
        };
        let records = docs();
        let found = filter_records(&records, &filters);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!("d1"));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filters = ExportFilters {
            categories: vec!["tutorial".into()],
            states: vec![PublishState::Draft],
            ..Default::default()
        };
        let records = docs();
        let found = filter_records(&records, &filters);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!("d3"));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filters = ExportFilters {
            dates: DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 10),
                end: NaiveDate::from_ymd_opt(2024, 3, 5),
            },
            ..Default::default()
        };
        let records = docs();
        let ids: Vec<_> = filter_records(&records, &filters)
            .iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, [json!("d1"), json!("d2")]);
    }

    #[test]
    fn test_date_range_falls_back_to_date_field() {
        let records = vec![
            record(json!({"version": "v1", "date": "2024-02-01"})),
            record(json!({"version": "v2"})),
        ];
        let filters = ExportFilters {
            dates: DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 1),
                end: None,
            },
            ..Default::default()
        };
        let found = filter_records(&records, &filters);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["version"], json!("v1"));
    }

    #[test]
    fn test_empty_result_is_no_data() {
        let request = ExportRequest {
            filters: ExportFilters {
                search: Some("nothing matches this".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = export(&docs(), RecordType::Document, &request, today()).unwrap_err();
        assert!(matches!(err, ExportError::NoData));
    }
}
