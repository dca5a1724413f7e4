//! Table rendering for import previews and record listings

use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{display_value, truncate_str};
use crate::entities::Record;
use crate::pipeline::issue::{error_count, rows_with_issues, warning_count, Issue};
use crate::pipeline::mapping::MappingSet;
use crate::pipeline::parser::RawTable;

/// Rows shown in an import preview
pub const PREVIEW_ROWS: usize = 10;

/// Issues shown in an import preview
pub const PREVIEW_ISSUES: usize = 20;

const CELL_WIDTH: usize = 24;

/// Field-to-column assignments
pub fn render_mapping(mapping: &MappingSet) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Column", "Required", "Type"]);
    for entry in mapping.entries() {
        builder.push_record([
            entry.field.clone(),
            entry.column.clone().unwrap_or_else(|| "-".to_string()),
            if entry.required { "yes" } else { "no" }.to_string(),
            entry.shape.to_string(),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// Headers and the first `limit` rows of a parsed table
pub fn render_rows(table: &RawTable, limit: usize) -> String {
    let rows = &table.rows()[..table.row_count().min(limit)];
    // long rows keep their extra cells under blank headers
    let width = rows
        .iter()
        .map(Vec::len)
        .fold(table.headers().len(), usize::max);

    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(
        (0..width).map(|col| truncate_str(table.headers().get(col).map(String::as_str).unwrap_or(""), CELL_WIDTH)),
    );
    builder.push_record(header);

    for (idx, row) in rows.iter().enumerate() {
        let mut record = vec![(idx + 1).to_string()];
        record.extend(
            (0..width).map(|col| truncate_str(row.get(col).map(String::as_str).unwrap_or(""), CELL_WIDTH)),
        );
        builder.push_record(record);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// The first `limit` issues
pub fn render_issues(issues: &[Issue], limit: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Row", "Column", "Severity", "Message"]);
    for issue in issues.iter().take(limit) {
        builder.push_record([
            issue.row.map_or_else(|| "all".to_string(), |r| r.to_string()),
            issue.column.clone(),
            issue.severity.to_string(),
            issue.message.clone(),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// Counts shown above the preview
pub fn render_summary(table: &RawTable, issues: &[Issue]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Total rows", "Columns", "Rows with issues", "Errors", "Warnings"]);
    builder.push_record([
        table.row_count().to_string(),
        table.headers().len().to_string(),
        rows_with_issues(issues).to_string(),
        error_count(issues).to_string(),
        warning_count(issues).to_string(),
    ]);
    builder.build().with(Style::markdown()).to_string()
}

/// Stored records, one column per requested key
pub fn render_records(records: &[Record], columns: &[&str]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|c| truncate_str(&display_value(record.get(*c)), 40)),
        );
    }
    builder.build().with(Style::markdown()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RecordType;
    use crate::pipeline::mapping::{auto_assign, default_mapping};
    use crate::pipeline::parser::parse;
    use crate::pipeline::validator::validate;

    #[test]
    fn test_mapping_table_lists_every_field() {
        let mapping = default_mapping(RecordType::Event);
        let rendered = render_mapping(&mapping);
        for field in RecordType::Event.field_names() {
            assert!(rendered.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_rows_table_respects_limit() {
        let csv = (1..=15).fold("name\n".to_string(), |acc, i| format!("{acc}Item {i}\n"));
        let table = parse(&csv).unwrap();
        let rendered = render_rows(&table, PREVIEW_ROWS);
        assert!(rendered.contains("Item 10"));
        assert!(!rendered.contains("Item 11"));
    }

    #[test]
    fn test_row_preview_shows_extra_cells() {
        let table = parse("name,price\nRing,5,overflow").unwrap();
        let rendered = render_rows(&table, PREVIEW_ROWS);
        assert!(rendered.contains("overflow"));
        assert!(rendered.contains("Ring"));
    }

    #[test]
    fn test_issue_table_marks_general_issues() {
        let table = parse("title\nHello").unwrap();
        let mapping = auto_assign(default_mapping(RecordType::Document), table.headers());
        let issues = validate(&table, &mapping);
        let rendered = render_issues(&issues, PREVIEW_ISSUES);
        assert!(rendered.contains("all"));
        assert!(rendered.contains("Required column for 'content' not found"));
    }

    #[test]
    fn test_summary_counts() {
        let table = parse("name,price\nRing,cheap\nHat,5").unwrap();
        let mapping = auto_assign(default_mapping(RecordType::ShopItem), table.headers());
        let issues = validate(&table, &mapping);
        let rendered = render_summary(&table, &issues);
        assert!(rendered.contains("| 2 "));
        assert!(rendered.contains("| 1 "));
    }
}
