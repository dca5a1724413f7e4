//! Core module - workspace, configuration, identity and storage

pub mod config;
pub mod identity;
pub mod notify;
pub mod project;
pub mod store;

pub use config::Config;
pub use identity::{IdParseError, RecordId};
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use project::{ProjectError, Workspace};
pub use store::{fetch_all, ListOptions, Lister, Page, PersistError, Persister, SqliteStore};
