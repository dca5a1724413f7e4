//! Tabular parser - turns pasted or uploaded CSV text into headers and string cells
//!
//! Lines are split on newline and each data line is scanned with a small
//! quoted-field state machine. Rows are never discarded: short or long rows
//! are flagged with a warning, and rows with an unterminated quote are flagged
//! with an error but kept so the preview can still show them.

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use super::issue::{Issue, GENERAL_COLUMN};

/// Errors that abort parsing before any preview is produced
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("CSV input is empty")]
    #[diagnostic(
        code(vct::parse::empty_input),
        help("the first non-blank line must contain the column headers")
    )]
    EmptyInput,
}

/// Parsed CSV content, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    issues: Vec<Issue>,
}

impl RawTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row-level findings recorded while parsing
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Position of the first header with the given name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }
}

/// Parse CSV text into a [`RawTable`]
///
/// Fails only when the trimmed input is empty.
pub fn parse(text: &str) -> Result<RawTable, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header_line = lines.next().ok_or(ParseError::EmptyInput)?;
    let headers = split_header(header_line);

    let mut rows = Vec::new();
    let mut issues = Vec::new();

    for line in lines {
        let row_num = rows.len() + 1;

        match split_row(line) {
            Ok(values) => {
                if values.len() != headers.len() {
                    issues.push(Issue::warning(
                        Some(row_num),
                        GENERAL_COLUMN,
                        format!(
                            "Expected {} columns, found {}",
                            headers.len(),
                            values.len()
                        ),
                    ));
                }
                rows.push(values);
            }
            Err(malformed) => {
                issues.push(Issue::error(
                    Some(row_num),
                    GENERAL_COLUMN,
                    format!("Failed to parse row: {}", malformed.reason),
                ));
                rows.push(malformed.partial);
            }
        }
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        issues = issues.len(),
        "parsed csv input"
    );

    Ok(RawTable {
        headers,
        rows,
        issues,
    })
}

/// Header cells: whitespace and wrapping quotes stripped
fn split_header(line: &str) -> Vec<String> {
    line.split(',')
        .map(|h| h.trim().trim_matches('"').trim().to_string())
        .collect()
}

/// A row that could not be scanned cleanly, with whatever was accumulated
struct MalformedRow {
    partial: Vec<String>,
    reason: &'static str,
}

fn split_row(line: &str) -> Result<Vec<String>, MalformedRow> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    if in_quotes {
        return Err(MalformedRow {
            partial: fields,
            reason: "unterminated quoted field",
        });
    }

    Ok(fields)
}
