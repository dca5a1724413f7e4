//! Import executor - persists coerced rows one at a time
//!
//! Validation runs first and blocks the run on any error-severity issue.
//! After that, each row succeeds or fails on its own: a persist failure is
//! logged and counted, and the next row is attempted.

use miette::Diagnostic;
use thiserror::Error;
use tracing::{info, warn};

use super::coercer::Coercer;
use super::input::InputError;
use super::issue::{error_count, has_blocking, Issue};
use super::mapping::MappingSet;
use super::parser::{ParseError, RawTable};
use super::progress::{ImportStage, ProgressTracker};
use super::validator::validate;
use crate::core::store::{PersistError, Persister};
use crate::entities::{Record, RecordDefaults, RecordType};

/// Failures that stop an import before any row is persisted
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("Found {} critical errors. Please fix them before importing.", error_count(.issues))]
    #[diagnostic(
        code(vct::import::validation_failed),
        help("run with --dry-run to review every issue, or adjust the mapping with --map field=column")
    )]
    ValidationFailed { issues: Vec<Issue> },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

/// A row that could not be persisted
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based position in the table
    pub row: usize,
    /// Identifying text for the row (natural key or id)
    pub label: String,
    pub error: PersistError,
}

/// Terminal result of an import run
#[derive(Debug)]
pub struct ImportSummary {
    pub record_type: RecordType,
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.failure_count == 0
    }

    /// Qualified success message, e.g. `Imported 4 documents (1 error)`
    pub fn message(&self) -> String {
        let noun = plural(self.success_count, self.record_type.label());
        if self.failure_count > 0 {
            format!(
                "Imported {} {} ({} {})",
                self.success_count,
                noun,
                self.failure_count,
                plural(self.failure_count, "error")
            )
        } else {
            format!("Imported {} {}", self.success_count, noun)
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Runs one import against a record store
pub struct ImportExecutor<'p, P: Persister + ?Sized> {
    persister: &'p mut P,
    record_type: RecordType,
    defaults: RecordDefaults,
}

impl<'p, P: Persister + ?Sized> ImportExecutor<'p, P> {
    pub fn new(persister: &'p mut P, record_type: RecordType, defaults: RecordDefaults) -> Self {
        Self {
            persister,
            record_type,
            defaults,
        }
    }

    /// Validate, then persist every row in table order
    pub fn run(
        &mut self,
        table: &RawTable,
        mapping: &MappingSet,
        progress: &mut ProgressTracker<'_>,
    ) -> Result<ImportSummary, ImportError> {
        progress.advance(ImportStage::Validating, "Validating rows");
        let issues = validate(table, mapping);
        if has_blocking(&issues) {
            return Err(ImportError::ValidationFailed { issues });
        }

        progress.set_total(table.row_count());
        progress.advance(
            ImportStage::Importing,
            format!("Importing {} rows", table.row_count()),
        );

        let coercer = Coercer::new(table.headers(), mapping, self.defaults.today);
        let mut summary = ImportSummary {
            record_type: self.record_type,
            success_count: 0,
            failure_count: 0,
            failures: Vec::new(),
        };

        for (idx, row) in table.rows().iter().enumerate() {
            let row_num = idx + 1;
            let mut candidate = coercer.coerce(row);
            self.record_type.apply_defaults(&mut candidate, &self.defaults);
            let label = row_label(self.record_type, &candidate);

            match self.persister.create(self.record_type, candidate) {
                Ok(_) => {
                    summary.success_count += 1;
                    progress.record_row(false, format!("Imported row {}", row_num));
                }
                Err(error) => {
                    warn!(
                        row = row_num,
                        record_type = %self.record_type,
                        record = %label,
                        error = %error,
                        "failed to import row"
                    );
                    summary.failure_count += 1;
                    progress.record_row(true, format!("Row {} failed: {}", row_num, error));
                    summary.failures.push(RowFailure {
                        row: row_num,
                        label,
                        error,
                    });
                }
            }
        }

        let message = summary.message();
        info!(
            record_type = %self.record_type,
            imported = summary.success_count,
            failed = summary.failure_count,
            "import complete"
        );
        progress.advance(ImportStage::Complete, message);

        Ok(summary)
    }
}

/// Natural key of the candidate, falling back to its id
fn row_label(record_type: RecordType, record: &Record) -> String {
    [record_type.natural_key(), "id"]
        .iter()
        .filter_map(|key| record.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .unwrap_or("<unnamed>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{Lister, ListOptions, SqliteStore};
    use crate::pipeline::mapping::{auto_assign, default_mapping};
    use crate::pipeline::parser::parse;
    use crate::pipeline::progress::ImportProgress;
    use chrono::NaiveDate;
    use serde_json::json;

    /// Stores candidates in memory and fails on one chosen call
    struct FlakyPersister {
        fail_on: Option<usize>,
        calls: usize,
        stored: Vec<Record>,
    }

    impl FlakyPersister {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on: Some(call),
                calls: 0,
                stored: Vec::new(),
            }
        }
    }

    impl Persister for FlakyPersister {
        fn create(&mut self, _: RecordType, record: Record) -> Result<Record, PersistError> {
            self.calls += 1;
            if self.fail_on == Some(self.calls) {
                return Err(PersistError::Storage("disk full".into()));
            }
            self.stored.push(record.clone());
            Ok(record)
        }

        fn update(&mut self, record_type: RecordType, id: &str, _: Record) -> Result<Record, PersistError> {
            Err(PersistError::NotFound {
                record_type,
                id: id.to_string(),
            })
        }
    }

    fn defaults() -> RecordDefaults {
        RecordDefaults {
            author: "Admin".into(),
            category: None,
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn prepare(record_type: RecordType, csv: &str) -> (RawTable, MappingSet) {
        let table = parse(csv).unwrap();
        let mapping = auto_assign(default_mapping(record_type), table.headers());
        (table, mapping)
    }

    #[test]
    fn test_single_row_import() {
        let (table, mapping) = prepare(
            RecordType::Document,
            "title,content,category\nHello,World,tutorial",
        );
        let mut store = FlakyPersister {
            fail_on: None,
            calls: 0,
            stored: Vec::new(),
        };
        let mut progress = ProgressTracker::new();
        let summary = ImportExecutor::new(&mut store, RecordType::Document, defaults())
            .run(&table, &mapping, &mut progress)
            .unwrap();

        assert_eq!(summary.success_count, 1);
        assert!(summary.is_clean());
        let record = &store.stored[0];
        assert_eq!(record["title"], json!("Hello"));
        assert_eq!(record["content"], json!("World"));
        assert_eq!(record["category"], json!("tutorial"));
        assert_eq!(record["author"], json!("Admin"));
        assert_eq!(progress.state().stage, ImportStage::Complete);
        assert_eq!(summary.message(), "Imported 1 document");
    }

    #[test]
    fn test_failed_row_does_not_stop_run() {
        let (table, mapping) = prepare(
            RecordType::Event,
            "name,description\nA,first\nB,second\nC,third\nD,fourth",
        );
        let mut store = FlakyPersister::failing_on(2);
        let mut progress = ProgressTracker::new();
        let summary = ImportExecutor::new(&mut store, RecordType::Event, defaults())
            .run(&table, &mapping, &mut progress)
            .unwrap();

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.failures[0].row, 2);
        assert_eq!(summary.failures[0].label, "B");
        let names: Vec<_> = store.stored.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, [json!("A"), json!("C"), json!("D")]);
        assert_eq!(summary.message(), "Imported 3 events (1 error)");

        let state = progress.state();
        assert_eq!(state.processed, 4);
        assert_eq!(state.total, 4);
        assert_eq!(state.failure_count, 1);
    }

    #[test]
    fn test_summary_message_counts() {
        let summary = |success_count, failure_count| ImportSummary {
            record_type: RecordType::ShopItem,
            success_count,
            failure_count,
            failures: Vec::new(),
        };
        assert_eq!(summary(0, 0).message(), "Imported 0 shop items");
        assert_eq!(summary(1, 2).message(), "Imported 1 shop item (2 errors)");
        assert_eq!(summary(5, 1).message(), "Imported 5 shop items (1 error)");
    }

    #[test]
    fn test_category_default_fills_missing_column() {
        let (table, mut mapping) = prepare(RecordType::Document, "title,content
Hello,World");
        mapping.satisfy_with_default("category").unwrap();
        let mut store = FlakyPersister::failing_on(99);
        let mut progress = ProgressTracker::new();
        let mut with_category = defaults();
        with_category.category = Some("tutorial".into());
        let summary = ImportExecutor::new(&mut store, RecordType::Document, with_category)
            .run(&table, &mapping, &mut progress)
            .unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(store.stored[0]["category"], json!("tutorial"));
    }

    #[test]
    fn test_blocking_issues_stop_before_persisting() {
        let (table, mapping) = prepare(RecordType::ShopItem, "name,price\nRing,cheap");
        let mut store = FlakyPersister::failing_on(99);
        let mut progress = ProgressTracker::new();
        let err = ImportExecutor::new(&mut store, RecordType::ShopItem, defaults())
            .run(&table, &mapping, &mut progress)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Found 1 critical errors. Please fix them before importing."
        );
        assert_eq!(store.calls, 0);
        assert_eq!(progress.state().stage, ImportStage::Validating);
    }

    #[test]
    fn test_warnings_do_not_block() {
        let (table, mapping) = prepare(
            RecordType::Document,
            "title,content,category,isPublished\nA,B,C,maybe",
        );
        let mut store = FlakyPersister::failing_on(99);
        let mut progress = ProgressTracker::new();
        let summary = ImportExecutor::new(&mut store, RecordType::Document, defaults())
            .run(&table, &mapping, &mut progress)
            .unwrap();
        assert_eq!(summary.success_count, 1);
        assert_eq!(store.stored[0]["isPublished"], json!(false));
    }

    #[test]
    fn test_progress_observer_sees_monotonic_stages() {
        let (table, mapping) = prepare(RecordType::Event, "name\nA\nB");
        let mut store = FlakyPersister::failing_on(99);
        let mut seen: Vec<ImportProgress> = Vec::new();
        {
            let mut progress = ProgressTracker::new().with_observer(|p: &ImportProgress| seen.push(p.clone()));
            ImportExecutor::new(&mut store, RecordType::Event, defaults())
                .run(&table, &mapping, &mut progress)
                .unwrap();
        }
        assert!(seen.windows(2).all(|w| w[0].stage <= w[1].stage));
        assert!(seen.windows(2).all(|w| w[0].processed <= w[1].processed));
        assert_eq!(seen.last().unwrap().stage, ImportStage::Complete);
    }

    #[test]
    fn test_duplicates_fail_per_row_against_sqlite() {
        let (table, mapping) = prepare(
            RecordType::UpdateLog,
            "version,title,content,date\nv1.0,First,a,2024-01-01\nv1.0,Again,b,2024-01-02\nv1.1,Second,c,2024-02-01",
        );
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut progress = ProgressTracker::new();
        let summary = ImportExecutor::new(&mut store, RecordType::UpdateLog, defaults())
            .run(&table, &mapping, &mut progress)
            .unwrap();

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count, 1);
        assert!(matches!(summary.failures[0].error, PersistError::Duplicate { .. }));

        let page = store.list(&ListOptions::new(RecordType::UpdateLog)).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[1]["version"], json!("v1.1"));
    }
}
