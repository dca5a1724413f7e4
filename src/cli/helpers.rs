//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::{Local, NaiveDate};
use miette::{IntoDiagnostic, Result};
use serde_json::Value;

use crate::cli::GlobalOpts;
use crate::core::{Config, NotificationCenter, NotificationKind, SqliteStore, Workspace};

/// Find the workspace named by --workspace, or discover it from the current directory
pub fn discover_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let workspace = match &global.workspace {
        Some(path) => Workspace::discover_from(path)?,
        None => Workspace::discover()?,
    };
    Ok(workspace)
}

/// Everything a workspace command needs: location, settings and a notification sink
pub struct Session {
    pub workspace: Workspace,
    pub config: Config,
    notifications: NotificationCenter,
    quiet: bool,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = discover_workspace(global)?;
        let config = Config::load(Some(&workspace));
        let notifications = NotificationCenter::new(config.notification_duration());
        Ok(Self {
            workspace,
            config,
            notifications,
            quiet: global.quiet,
        })
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        let path = self.config.database_path(&self.workspace);
        tracing::debug!(path = %path.display(), "opening record store");
        Ok(SqliteStore::open(&path)?)
    }

    /// Push a notification and print it to stderr
    ///
    /// With --quiet only warnings and errors are printed.
    pub fn notify(&mut self, kind: NotificationKind, title: &str, message: &str) {
        let notification = self.notifications.push(kind, title, message);
        let important = matches!(kind, NotificationKind::Error | NotificationKind::Warning);
        if !self.quiet || important {
            eprintln!("{}", notification.render());
        }
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Write bytes to a file, creating parent directories
pub fn write_file(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    std::fs::write(path, bytes).into_diagnostic()
}

/// Display text for a record field in tables
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_value(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
