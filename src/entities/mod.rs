//! Record type definitions
//!
//! Records travel through the pipeline as untyped JSON objects; the
//! [`RecordType`] registry declares which fields each type imports and how
//! unset fields are defaulted.

pub mod record_type;
pub mod tags;

pub use record_type::{FieldSpec, RecordDefaults, RecordType};
pub use tags::TagList;

/// A record as exchanged with the record store: ordered key/value pairs
pub type Record = serde_json::Map<String, serde_json::Value>;
