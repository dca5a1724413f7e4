//! Validator - checks parsed rows against a mapping set without touching them
//!
//! The table's own parse findings are carried through first. Missing
//! columns are reported once per mapping entry; empty required cells and
//! shape mismatches are reported once per offending row.

use super::coercer::{parse_bool, parse_date, parse_number};
use super::issue::{Issue, GENERAL_COLUMN};
use super::mapping::{FieldMapping, FieldShape, MappingSet};
use super::parser::RawTable;

/// Validate every row of `table` against `mapping`
pub fn validate(table: &RawTable, mapping: &MappingSet) -> Vec<Issue> {
    let mut issues = table.issues().to_vec();
    let mut columns: Vec<(&FieldMapping, &str, usize)> = Vec::new();

    for entry in mapping.entries() {
        let Some(column) = entry.column.as_deref() else {
            if entry.required {
                issues.push(Issue::error(
                    None,
                    GENERAL_COLUMN,
                    format!("Required column for '{}' not found", entry.field),
                ));
            }
            continue;
        };

        match table.column_index(column) {
            Some(idx) => columns.push((entry, column, idx)),
            None if entry.required => issues.push(Issue::error(
                None,
                column,
                format!("Required column '{}' not found", column),
            )),
            None => issues.push(Issue::warning(
                None,
                column,
                format!(
                    "Column '{}' not found; '{}' will use its default",
                    column, entry.field
                ),
            )),
        }
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row_num = row_idx + 1;

        for (entry, column, idx) in &columns {
            let value = row.get(*idx).map(String::as_str).unwrap_or("");

            if value.trim().is_empty() {
                if entry.required {
                    issues.push(Issue::error(
                        Some(row_num),
                        *column,
                        format!("Required field '{}' is empty", entry.field),
                    ));
                }
                continue;
            }

            if let Some(issue) = check_shape(row_num, column, value, entry.shape) {
                issues.push(issue);
            }
        }
    }

    issues
}

fn check_shape(row: usize, column: &str, value: &str, shape: FieldShape) -> Option<Issue> {
    match shape {
        FieldShape::Number if parse_number(value).is_none() => Some(Issue::error(
            Some(row),
            column,
            format!("Invalid number format: '{}'", value),
        )),
        // Boolean coercion always succeeds, so a mismatch is only advisory
        FieldShape::Boolean if parse_bool(value).is_none() => Some(Issue::warning(
            Some(row),
            column,
            format!(
                "Invalid boolean format: '{}'. Use true/false, 1/0, or yes/no",
                value
            ),
        )),
        FieldShape::Date if parse_date(value).is_none() => Some(Issue::error(
            Some(row),
            column,
            format!("Invalid date format: '{}'", value),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RecordType;
    use crate::pipeline::issue::{error_count, has_blocking, Severity};
    use crate::pipeline::mapping::{auto_assign, default_mapping};
    use crate::pipeline::parser::parse;

    fn mapped(record_type: RecordType, csv: &str) -> (RawTable, MappingSet) {
        let table = parse(csv).unwrap();
        let mapping = auto_assign(default_mapping(record_type), table.headers());
        (table, mapping)
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        let (table, mapping) = mapped(
            RecordType::Document,
            "title,content,category\nHello,World,tutorial",
        );
        let issues = validate(&table, &mapping);
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_missing_required_column_reported_once() {
        let (table, mapping) = mapped(RecordType::Document, "title,content\nA,B\nC,D\nE,F");
        let issues = validate(&table, &mapping);

        let missing: Vec<_> = issues
            .iter()
            .filter(|i| i.message.contains("'category'"))
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].row, None);
        assert_eq!(missing[0].column, GENERAL_COLUMN);
        assert!(has_blocking(&issues));
    }

    #[test]
    fn test_empty_required_cell_per_row() {
        let (table, mapping) = mapped(
            RecordType::Document,
            "title,content,category\n,World,tutorial\nHi,,guide\nOk,Fine,general",
        );
        let issues = validate(&table, &mapping);
        assert_eq!(error_count(&issues), 2);
        assert_eq!(issues[0].row, Some(1));
        assert_eq!(issues[0].column, "title");
        assert_eq!(issues[1].row, Some(2));
        assert_eq!(issues[1].column, "content");
    }

    #[test]
    fn test_number_shape_error() {
        let (table, mapping) = mapped(RecordType::ShopItem, "name,price\nRing,12.5\nHat,cheap");
        let issues = validate(&table, &mapping);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].row, Some(2));
        assert_eq!(issues[0].message, "Invalid number format: 'cheap'");
    }

    #[test]
    fn test_boolean_shape_is_warning() {
        let (table, mapping) = mapped(
            RecordType::Document,
            "title,content,category,isPublished\nA,B,C,maybe\nD,E,F,YES",
        );
        let issues = validate(&table, &mapping);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].row, Some(1));
        assert!(!has_blocking(&issues));
    }

    #[test]
    fn test_date_shape_error() {
        let (table, mapping) = mapped(
            RecordType::UpdateLog,
            "version,title,content,date\nv1,T,C,2024-01-15\nv2,T,C,someday",
        );
        let issues = validate(&table, &mapping);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].row, Some(2));
    }

    #[test]
    fn test_blank_optional_cells_are_fine() {
        let (table, mapping) = mapped(RecordType::ShopItem, "name,price,isLimited\nRing,,");
        assert!(validate(&table, &mapping).is_empty());
    }

    #[test]
    fn test_parse_issues_are_carried_through() {
        let (table, mapping) = mapped(
            RecordType::Document,
            "title,content,category\nHello,World",
        );
        let issues = validate(&table, &mapping);
        assert_eq!(issues[0], table.issues()[0]);
        // Short row: category cell is missing, which is also an empty required field
        assert_eq!(error_count(&issues), 1);
    }

    #[test]
    fn test_overridden_column_absent_from_headers() {
        let (table, mut mapping) = mapped(RecordType::Event, "name\nSummer Festival");
        mapping.assign("name", Some("Title".to_string())).unwrap();
        mapping.assign("description", Some("Blurb".to_string())).unwrap();
        let issues = validate(&table, &mapping);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].column, "Title");
        assert_eq!(issues[1].severity, Severity::Warning);
        assert_eq!(issues[1].column, "Blurb");
    }

    #[test]
    fn test_validate_does_not_mutate_table() {
        let (table, mapping) = mapped(RecordType::Document, "title\n");
        let before = table.clone();
        let _ = validate(&table, &mapping);
        assert_eq!(table, before);
    }
}
