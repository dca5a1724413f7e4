//! Field mapping - which CSV column feeds which logical record field
//!
//! A [`MappingSet`] starts from the record type's declared fields (see
//! [`RecordType::fields`]), gets columns auto-assigned from the CSV headers,
//! and can then be overridden freely before validation.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::entities::RecordType;

/// Expected primitive shape of a logical field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldShape {
    String,
    Number,
    Boolean,
    Date,
    StringList,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldShape::String => write!(f, "string"),
            FieldShape::Number => write!(f, "number"),
            FieldShape::Boolean => write!(f, "boolean"),
            FieldShape::Date => write!(f, "date"),
            FieldShape::StringList => write!(f, "list"),
        }
    }
}

/// One logical field and the column assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub field: String,
    /// Source CSV column, `None` when unmapped
    pub column: Option<String>,
    pub required: bool,
    pub shape: FieldShape,
}

#[derive(Debug, Error, Diagnostic)]
pub enum MappingError {
    #[error("unknown field '{field}' for {record_type}")]
    #[diagnostic(code(vct::mapping::unknown_field), help("valid fields: {valid}"))]
    UnknownField {
        field: String,
        record_type: RecordType,
        valid: String,
    },

    #[error("invalid mapping override '{0}' (expected field=column)")]
    #[diagnostic(code(vct::mapping::invalid_override))]
    InvalidOverride(String),

    #[error("failed to read mapping file: {0}")]
    #[diagnostic(code(vct::mapping::file))]
    File(String),
}

/// Ordered mapping declaration for one record type and one import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSet {
    record_type: RecordType,
    entries: Vec<FieldMapping>,
}

/// The declared fields of a record type, all unmapped
pub fn default_mapping(record_type: RecordType) -> MappingSet {
    let entries = record_type
        .fields()
        .iter()
        .map(|spec| FieldMapping {
            field: spec.name.to_string(),
            column: None,
            required: spec.required,
            shape: spec.shape,
        })
        .collect();

    MappingSet {
        record_type,
        entries,
    }
}

/// Fill every unmapped field with the first header that matches it
///
/// A header matches when, compared case-insensitively and ignoring
/// punctuation, either name contains the other. Existing assignments are
/// left alone and fields without a match stay unmapped.
pub fn auto_assign(mut mapping: MappingSet, headers: &[String]) -> MappingSet {
    for entry in mapping.entries.iter_mut().filter(|e| e.column.is_none()) {
        let field = normalize(&entry.field);
        entry.column = headers
            .iter()
            .find(|header| {
                let header = normalize(header);
                !header.is_empty() && (header.contains(&field) || field.contains(&header))
            })
            .cloned();
    }
    mapping
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl MappingSet {
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    pub fn get(&self, field: &str) -> Option<&FieldMapping> {
        self.entries.iter().find(|e| e.field == field)
    }

    fn entry_mut(&mut self, field: &str) -> Result<&mut FieldMapping, MappingError> {
        let record_type = self.record_type;
        self.entries
            .iter_mut()
            .find(|e| e.field == field)
            .ok_or_else(|| MappingError::UnknownField {
                field: field.to_string(),
                record_type,
                valid: record_type.field_names().join(", "),
            })
    }

    /// Point a field at a column, or unmap it with `None`
    pub fn assign(&mut self, field: &str, column: Option<String>) -> Result<(), MappingError> {
        self.entry_mut(field)?.column = column.filter(|c| !c.trim().is_empty());
        Ok(())
    }

    /// Stop requiring a field whose value will be filled in by a default
    pub fn satisfy_with_default(&mut self, field: &str) -> Result<(), MappingError> {
        self.entry_mut(field)?.required = false;
        Ok(())
    }

    /// Apply `field -> column` overrides; an empty column unmaps the field
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) -> Result<(), MappingError> {
        for (field, column) in overrides {
            self.assign(field, Some(column.clone()))?;
        }
        Ok(())
    }

    /// Load overrides from a YAML document of `field: column` pairs
    pub fn apply_overrides_yaml(&mut self, yaml: &str) -> Result<(), MappingError> {
        let overrides: BTreeMap<String, String> =
            serde_yml::from_str(yaml).map_err(|e| MappingError::File(e.to_string()))?;
        self.apply_overrides(&overrides)
    }

    /// Number of fields with a column assigned
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.column.is_some()).count()
    }
}

/// Parse a `field=column` command-line override
pub fn parse_override(s: &str) -> Result<(String, String), MappingError> {
    let (field, column) = s
        .split_once('=')
        .ok_or_else(|| MappingError::InvalidOverride(s.to_string()))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(MappingError::InvalidOverride(s.to_string()));
    }
    Ok((field.to_string(), column.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_mapping_is_unmapped() {
        let mapping = default_mapping(RecordType::Document);
        assert_eq!(mapping.entries().len(), RecordType::Document.fields().len());
        assert_eq!(mapping.mapped_count(), 0);

        let title = mapping.get("title").unwrap();
        assert!(title.required);
        assert_eq!(title.shape, FieldShape::String);
        assert_eq!(mapping.get("tags").unwrap().shape, FieldShape::StringList);
    }

    #[test]
    fn test_auto_assign_case_insensitive_substring() {
        let mapping = auto_assign(
            default_mapping(RecordType::Document),
            &headers(&["Document Title", "CONTENT", "Category", "Published"]),
        );
        assert_eq!(mapping.get("title").unwrap().column.as_deref(), Some("Document Title"));
        assert_eq!(mapping.get("content").unwrap().column.as_deref(), Some("CONTENT"));
        assert_eq!(mapping.get("category").unwrap().column.as_deref(), Some("Category"));
        // "published" is contained in "isPublished"
        assert_eq!(mapping.get("isPublished").unwrap().column.as_deref(), Some("Published"));
        assert_eq!(mapping.get("author").unwrap().column, None);
    }

    #[test]
    fn test_auto_assign_ignores_separators() {
        let mapping = auto_assign(
            default_mapping(RecordType::Document),
            &headers(&["created_at", "updated-at"]),
        );
        assert_eq!(mapping.get("createdAt").unwrap().column.as_deref(), Some("created_at"));
        assert_eq!(mapping.get("updatedAt").unwrap().column.as_deref(), Some("updated-at"));
    }

    #[test]
    fn test_auto_assign_first_match_wins() {
        let mapping = auto_assign(
            default_mapping(RecordType::Document),
            &headers(&["title_en", "title_jp"]),
        );
        assert_eq!(mapping.get("title").unwrap().column.as_deref(), Some("title_en"));
    }

    #[test]
    fn test_satisfy_with_default_clears_required() {
        let mut mapping = default_mapping(RecordType::Document);
        mapping.satisfy_with_default("category").unwrap();
        assert!(!mapping.get("category").unwrap().required);
        assert!(mapping.get("title").unwrap().required);
        assert!(mapping.satisfy_with_default("colour").is_err());
    }

    #[test]
    fn test_auto_assign_keeps_existing_assignment() {
        let mut mapping = default_mapping(RecordType::Document);
        mapping.assign("title", Some("Headline".to_string())).unwrap();
        let mapping = auto_assign(mapping, &headers(&["title", "Headline"]));
        assert_eq!(mapping.get("title").unwrap().column.as_deref(), Some("Headline"));
    }

    #[test]
    fn test_auto_assign_skips_empty_headers() {
        let mapping = auto_assign(default_mapping(RecordType::Document), &headers(&["", "body"]));
        assert_eq!(mapping.mapped_count(), 0);
    }

    #[test]
    fn test_assign_unknown_field_fails() {
        let mut mapping = default_mapping(RecordType::Event);
        let err = mapping.assign("nope", Some("x".to_string())).unwrap_err();
        assert!(matches!(err, MappingError::UnknownField { .. }));
    }

    #[test]
    fn test_assign_empty_column_unmaps() {
        let mut mapping = auto_assign(default_mapping(RecordType::Document), &headers(&["title"]));
        mapping.assign("title", Some("  ".to_string())).unwrap();
        assert_eq!(mapping.get("title").unwrap().column, None);
    }

    #[test]
    fn test_apply_overrides_yaml() {
        let mut mapping = default_mapping(RecordType::UpdateLog);
        mapping
            .apply_overrides_yaml("version: Ver\ntitle: Headline\ndescription: \"\"\n")
            .unwrap();
        assert_eq!(mapping.get("version").unwrap().column.as_deref(), Some("Ver"));
        assert_eq!(mapping.get("title").unwrap().column.as_deref(), Some("Headline"));
        assert_eq!(mapping.get("description").unwrap().column, None);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("title=Headline").unwrap(),
            ("title".to_string(), "Headline".to_string())
        );
        assert_eq!(
            parse_override("author=").unwrap(),
            ("author".to_string(), String::new())
        );
        assert!(parse_override("title").is_err());
        assert!(parse_override("=x").is_err());
    }
}
