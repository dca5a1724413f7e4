//! Record identity using type-prefixed ULIDs

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

use crate::entities::RecordType;

/// A generated record identifier, e.g. `DOC-01HQ3K4N5M6P7R8S9T0VWXYZ12`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    record_type: RecordType,
    ulid: Ulid,
}

impl RecordId {
    /// Create a new RecordId for the given record type
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            ulid: Ulid::new(),
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Parse a RecordId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.record_type.id_prefix(), self.ulid)
    }
}

impl FromStr for RecordId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let record_type = RecordType::all()
            .iter()
            .copied()
            .find(|t| t.id_prefix().eq_ignore_ascii_case(prefix))
            .ok_or_else(|| IdParseError::InvalidPrefix(prefix.to_string()))?;

        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { record_type, ulid })
    }
}

/// Errors that can occur when parsing record IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid record prefix: '{0}' (valid: DOC, LOG, EVT, SHOP)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in record ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_generation() {
        let id = RecordId::new(RecordType::Document);
        assert!(id.to_string().starts_with("DOC-"));
        assert_eq!(id.to_string().len(), 30); // DOC- (4) + ULID (26)
    }

    #[test]
    fn test_record_id_roundtrip() {
        let original = RecordId::new(RecordType::UpdateLog);
        let parsed = RecordId::parse(&original.to_string()).unwrap();
        assert_eq!(parsed.record_type(), RecordType::UpdateLog);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_record_id_invalid_prefix() {
        let err = RecordId::parse("XXX-01HQ3K4N5M6P7R8S9T0VWXYZ12").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_record_id_missing_delimiter() {
        let err = RecordId::parse("DOC01HQ3K4N5M6P7R8S9T0VWXYZ12").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_record_id_invalid_ulid() {
        let err = RecordId::parse("DOC-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = RecordId::new(RecordType::Event);
        let b = RecordId::new(RecordType::Event);
        assert_ne!(a, b);
    }
}
