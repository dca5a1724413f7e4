//! Record store - the persistence collaborator behind import and export
//!
//! The pipeline only sees the [`Persister`] and [`Lister`] traits. The
//! SQLite implementation keeps every record as a JSON document and enforces
//! uniqueness of the id and of the record type's natural key.

use miette::Diagnostic;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::entities::{Record, RecordType};

const SCHEMA_VERSION: i32 = 1;

/// Page size used when reading a whole record type
const FETCH_PAGE: usize = 200;

/// Errors raised by the record store for a single record or query
#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("{record_type} with {field} '{value}' already exists")]
    #[diagnostic(code(vct::store::duplicate))]
    Duplicate {
        record_type: RecordType,
        field: String,
        value: String,
    },

    #[error("{record_type} '{id}' not found")]
    #[diagnostic(code(vct::store::not_found))]
    NotFound { record_type: RecordType, id: String },

    #[error("record is missing required field '{0}'")]
    #[diagnostic(code(vct::store::missing_field))]
    MissingField(String),

    #[error("storage error: {0}")]
    #[diagnostic(code(vct::store::storage))]
    Storage(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(e: rusqlite::Error) -> Self {
        PersistError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Storage(e.to_string())
    }
}

/// Creates and updates records
pub trait Persister {
    /// Store a new record and return it as stored
    fn create(&mut self, record_type: RecordType, record: Record) -> Result<Record, PersistError>;

    /// Merge `partial` into an existing record and return the result
    fn update(
        &mut self,
        record_type: RecordType,
        id: &str,
        partial: Record,
    ) -> Result<Record, PersistError>;
}

/// Paging options for [`Lister::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub record_type: RecordType,
    pub limit: usize,
    pub offset: usize,
}

impl ListOptions {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            limit: 50,
            offset: 0,
        }
    }
}

/// One page of records plus the total count for the type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    pub total: usize,
}

/// Reads records
pub trait Lister {
    fn list(&self, options: &ListOptions) -> Result<Page, PersistError>;

    fn get(&self, record_type: RecordType, id: &str) -> Result<Record, PersistError>;
}

/// Read every record of a type, in insertion order
pub fn fetch_all(lister: &dyn Lister, record_type: RecordType) -> Result<Vec<Record>, PersistError> {
    let mut options = ListOptions {
        record_type,
        limit: FETCH_PAGE,
        offset: 0,
    };
    let mut records = Vec::new();

    loop {
        let page = lister.list(&options)?;
        let fetched = page.items.len();
        records.extend(page.items);
        options.offset += fetched;
        if fetched == 0 || options.offset >= page.total {
            break;
        }
    }

    Ok(records)
}

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::Storage(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a throwaway store in memory
    pub fn open_in_memory() -> Result<Self, PersistError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), PersistError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                record_type TEXT NOT NULL,
                id TEXT NOT NULL,
                natural_key TEXT,
                body TEXT NOT NULL,
                created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (record_type, id),
                UNIQUE (record_type, natural_key)
            );
            CREATE INDEX IF NOT EXISTS idx_records_type ON records(record_type);
            "#,
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Map a UNIQUE violation to a duplicate error naming the clashing field
    fn conflict(
        &self,
        err: rusqlite::Error,
        record_type: RecordType,
        id: &str,
        natural_key: Option<&str>,
    ) -> PersistError {
        let is_unique = matches!(
            &err,
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
        );
        if !is_unique {
            return err.into();
        }

        if err.to_string().contains("records.natural_key") {
            PersistError::Duplicate {
                record_type,
                field: record_type.natural_key().to_string(),
                value: natural_key.unwrap_or_default().to_string(),
            }
        } else {
            PersistError::Duplicate {
                record_type,
                field: "id".to_string(),
                value: id.to_string(),
            }
        }
    }
}

/// Text of a field used as a key, `None` when absent or blank
fn key_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Persister for SqliteStore {
    fn create(&mut self, record_type: RecordType, record: Record) -> Result<Record, PersistError> {
        let id = key_text(&record, "id").ok_or_else(|| PersistError::MissingField("id".into()))?;
        let natural_key = key_text(&record, record_type.natural_key());
        let body = serde_json::to_string(&record)?;

        self.conn
            .execute(
                "INSERT INTO records (record_type, id, natural_key, body) VALUES (?1, ?2, ?3, ?4)",
                params![record_type.as_str(), id, natural_key, body],
            )
            .map_err(|e| self.conflict(e, record_type, &id, natural_key.as_deref()))?;

        Ok(record)
    }

    fn update(
        &mut self,
        record_type: RecordType,
        id: &str,
        partial: Record,
    ) -> Result<Record, PersistError> {
        let mut record = self.get(record_type, id)?;
        for (key, value) in partial {
            if key != "id" {
                record.insert(key, value);
            }
        }

        let natural_key = key_text(&record, record_type.natural_key());
        let body = serde_json::to_string(&record)?;
        self.conn
            .execute(
                "UPDATE records SET natural_key = ?1, body = ?2 WHERE record_type = ?3 AND id = ?4",
                params![natural_key, body, record_type.as_str(), id],
            )
            .map_err(|e| self.conflict(e, record_type, id, natural_key.as_deref()))?;

        Ok(record)
    }
}

impl Lister for SqliteStore {
    fn list(&self, options: &ListOptions) -> Result<Page, PersistError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE record_type = ?1",
            params![options.record_type.as_str()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT body FROM records WHERE record_type = ?1 ORDER BY seq LIMIT ?2 OFFSET ?3",
        )?;
        let bodies = stmt
            .query_map(
                params![
                    options.record_type.as_str(),
                    options.limit as i64,
                    options.offset as i64
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let items = bodies
            .iter()
            .map(|body| serde_json::from_str::<Record>(body))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: total as usize,
        })
    }

    fn get(&self, record_type: RecordType, id: &str) -> Result<Record, PersistError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE record_type = ?1 AND id = ?2",
                params![record_type.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;

        let body = body.ok_or_else(|| PersistError::NotFound {
            record_type,
            id: id.to_string(),
        })?;
        Ok(serde_json::from_str(&body)?)
    }
}
