//! Severity-tagged findings produced while parsing and validating CSV input

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Column label used for findings that are not tied to a single column
pub const GENERAL_COLUMN: &str = "general";

/// Two-level classification attached to every finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the import
    Error,
    /// Advisory only
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single parse or validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// 1-based position within the parsed rows, `None` when it affects every row
    pub row: Option<usize>,
    pub column: String,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    pub fn error(row: Option<usize>, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(
        row: Option<usize>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {}: {}", row, self.message),
            None => write!(f, "All rows: {}", self.message),
        }
    }
}

/// True when at least one error-severity finding is present
pub fn has_blocking(issues: &[Issue]) -> bool {
    issues.iter().any(Issue::is_error)
}

pub fn error_count(issues: &[Issue]) -> usize {
    issues.iter().filter(|i| i.is_error()).count()
}

pub fn warning_count(issues: &[Issue]) -> usize {
    issues.iter().filter(|i| !i.is_error()).count()
}

/// Number of distinct rows carrying at least one finding
pub fn rows_with_issues(issues: &[Issue]) -> usize {
    issues
        .iter()
        .filter_map(|i| i.row)
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_requires_an_error() {
        let warnings = vec![Issue::warning(Some(1), GENERAL_COLUMN, "short row")];
        assert!(!has_blocking(&warnings));

        let mut mixed = warnings.clone();
        mixed.push(Issue::error(Some(2), "title", "empty"));
        assert!(has_blocking(&mixed));
        assert_eq!(error_count(&mixed), 1);
        assert_eq!(warning_count(&mixed), 1);
    }

    #[test]
    fn test_rows_with_issues_counts_distinct_rows() {
        let issues = vec![
            Issue::error(Some(2), "title", "empty"),
            Issue::warning(Some(2), "flag", "odd boolean"),
            Issue::error(None, GENERAL_COLUMN, "missing column"),
            Issue::warning(Some(5), GENERAL_COLUMN, "short row"),
        ];
        assert_eq!(rows_with_issues(&issues), 2);
    }

    #[test]
    fn test_display_mentions_row() {
        let issue = Issue::error(Some(3), "title", "Required field 'title' is empty");
        assert_eq!(issue.to_string(), "Row 3: Required field 'title' is empty");

        let general = Issue::error(None, GENERAL_COLUMN, "Required column not found");
        assert_eq!(general.to_string(), "All rows: Required column not found");
    }
}
