//! Record types managed by the toolkit and their declared import fields
//!
//! Every record type's fields live in one declarative table, [`FIELD_TABLE`],
//! looked up once per import via [`RecordType::fields`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use super::Record;
use crate::core::identity::RecordId;
use crate::pipeline::coercer::format_date;
use crate::pipeline::mapping::FieldShape;

/// Content areas of the reference site that support bulk import/export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordType {
    /// Guide / documentation page
    Document,
    /// Release note for a site update
    UpdateLog,
    /// In-game event
    Event,
    /// Shop listing
    ShopItem,
}

/// Declaration of one importable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub shape: FieldShape,
}

const fn required(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec {
        name,
        required: true,
        shape,
    }
}

const fn optional(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec {
        name,
        required: false,
        shape,
    }
}

use crate::pipeline::mapping::FieldShape::{Boolean, Date, Number, String as Text, StringList};

/// Record type -> ordered import fields
pub static FIELD_TABLE: &[(RecordType, &[FieldSpec])] = &[
    (
        RecordType::Document,
        &[
            required("title", Text),
            required("content", Text),
            required("category", Text),
            optional("tags", StringList),
            optional("author", Text),
            optional("isPublished", Boolean),
            optional("createdAt", Date),
            optional("updatedAt", Date),
        ],
    ),
    (
        RecordType::UpdateLog,
        &[
            required("version", Text),
            required("title", Text),
            optional("description", Text),
            required("content", Text),
            required("date", Date),
            optional("tags", StringList),
            optional("isPublished", Boolean),
        ],
    ),
    (
        RecordType::Event,
        &[
            required("name", Text),
            optional("description", Text),
            optional("eventType", Text),
            optional("startDate", Date),
            optional("endDate", Date),
        ],
    ),
    (
        RecordType::ShopItem,
        &[
            required("name", Text),
            optional("description", Text),
            optional("category", Text),
            optional("currency", Text),
            optional("price", Number),
            optional("rarity", Text),
            optional("isLimited", Boolean),
        ],
    ),
];

/// Values used to fill fields a row left unset
#[derive(Debug, Clone)]
pub struct RecordDefaults {
    /// Author stamped on imported documents
    pub author: String,
    /// Category for documents imported without one
    pub category: Option<String>,
    pub today: NaiveDate,
}

impl RecordType {
    pub fn all() -> &'static [RecordType] {
        &[
            RecordType::Document,
            RecordType::UpdateLog,
            RecordType::Event,
            RecordType::ShopItem,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Document => "document",
            RecordType::UpdateLog => "update-log",
            RecordType::Event => "event",
            RecordType::ShopItem => "shop-item",
        }
    }

    /// Plural slug used for export filenames
    pub fn plural(&self) -> &'static str {
        match self {
            RecordType::Document => "documents",
            RecordType::UpdateLog => "update-logs",
            RecordType::Event => "events",
            RecordType::ShopItem => "shop-items",
        }
    }

    /// Human label used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Document => "document",
            RecordType::UpdateLog => "update log",
            RecordType::Event => "event",
            RecordType::ShopItem => "shop item",
        }
    }

    /// Identifier prefix for generated IDs
    pub fn id_prefix(&self) -> &'static str {
        match self {
            RecordType::Document => "DOC",
            RecordType::UpdateLog => "LOG",
            RecordType::Event => "EVT",
            RecordType::ShopItem => "SHOP",
        }
    }

    /// Field that must be unique among records of this type
    pub fn natural_key(&self) -> &'static str {
        match self {
            RecordType::Document => "title",
            RecordType::UpdateLog => "version",
            RecordType::Event | RecordType::ShopItem => "name",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        FIELD_TABLE
            .iter()
            .find(|(record_type, _)| record_type == self)
            .map(|(_, fields)| *fields)
            .unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.name).collect()
    }

    /// Fill in fields the record collaborator needs that the row left unset
    pub fn apply_defaults(&self, record: &mut Record, defaults: &RecordDefaults) {
        let today = format_date(defaults.today);

        if is_unset(record, "id") {
            record.insert("id".into(), json!(RecordId::new(*self).to_string()));
        }

        match self {
            RecordType::Document => {
                if let Some(category) = &defaults.category {
                    set_default(record, "category", json!(category));
                }
                set_default(record, "author", json!(defaults.author));
                set_default(record, "isPublished", json!(false));
                set_default(record, "tags", json!([]));
            }
            RecordType::UpdateLog => {
                set_default(record, "version", json!("v1.0.0"));
                set_default(record, "title", json!("Untitled Update"));
                set_default(record, "content", json!(""));
                set_default(record, "description", json!(""));
                set_default(record, "date", json!(today));
                set_default(record, "isPublished", json!(false));
                set_default(record, "tags", json!([]));
                set_default(record, "technicalDetails", json!([]));
                set_default(record, "bugFixes", json!([]));
                set_default(record, "screenshots", json!([]));
                set_default(
                    record,
                    "metrics",
                    json!({
                        "performanceImprovement": "0%",
                        "userSatisfaction": "0%",
                        "bugReports": 0
                    }),
                );
            }
            RecordType::Event => {}
            RecordType::ShopItem => {
                set_default(record, "currency", json!("coins"));
                set_default(record, "isLimited", json!(false));
            }
        }

        set_default(record, "createdAt", json!(today));
        set_default(record, "updatedAt", json!(today));
    }
}

/// A field is unset when absent, null, or an empty string
pub fn is_unset(record: &Record, key: &str) -> bool {
    match record.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn set_default(record: &mut Record, key: &str, value: Value) {
    if is_unset(record, key) {
        record.insert(key.to_string(), value);
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" | "documents" | "doc" | "docs" => Ok(RecordType::Document),
            "update-log" | "update-logs" | "updatelog" | "log" | "logs" => {
                Ok(RecordType::UpdateLog)
            }
            "event" | "events" => Ok(RecordType::Event),
            "shop-item" | "shop-items" | "shop" | "item" => Ok(RecordType::ShopItem),
            _ => Err(format!(
                "Unsupported record type: '{}'. Supported: document, update-log, event, shop-item",
                s
            )),
        }
    }
}
