//! Bulk import/export pipeline
//!
//! Raw text flows through [`parser`] into a [`RawTable`], is matched to
//! record fields by [`mapping`], checked by [`validator`], turned into
//! candidate records by [`coercer`] and persisted row by row by
//! [`executor`]. [`exporter`] goes the other way.

pub mod coercer;
pub mod executor;
pub mod exporter;
pub mod input;
pub mod issue;
pub mod mapping;
pub mod parser;
pub mod progress;
pub mod validator;

pub use coercer::Coercer;
pub use executor::{ImportError, ImportExecutor, ImportSummary, RowFailure};
pub use exporter::{export, DateRange, ExportError, ExportFilters, ExportFormat, ExportOutput, ExportRequest, PublishState};
pub use input::{read_source, InputError, InputRejected};
pub use issue::{Issue, Severity};
pub use mapping::{auto_assign, default_mapping, FieldMapping, FieldShape, MappingError, MappingSet};
pub use parser::{parse, ParseError, RawTable};
pub use progress::{ImportProgress, ImportStage, ProgressTracker};
pub use validator::validate;
