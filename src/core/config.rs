//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::project::Workspace;
use crate::pipeline::exporter::ExportFormat;
use crate::pipeline::input::MAX_UPLOAD_BYTES;

/// Default author stamped on imported documents
pub const DEFAULT_AUTHOR: &str = "Admin";

/// Default record store location, relative to the workspace root
pub const DEFAULT_DATABASE: &str = ".vct/content.db";

const DEFAULT_NOTIFICATION_SECS: u64 = 5;

/// Toolkit configuration with layered hierarchy
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Author stamped on imported documents
    pub author: Option<String>,

    /// Record store path
    pub database: Option<PathBuf>,

    /// Format used by `vct export` when --format is not given
    pub default_export_format: Option<ExportFormat>,

    /// Largest accepted import source, in bytes
    pub max_upload_bytes: Option<u64>,

    /// How long a notification stays visible
    pub notification_duration_secs: Option<u64>,

    /// Log filter used when VCT_LOG is unset
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config (~/.config/vct/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.vct/config.yaml)
        if let Some(workspace) = workspace {
            if let Some(local) = Self::read_file(&workspace.vct_dir().join("config.yaml")) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("VCT_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(database) = std::env::var("VCT_DATABASE") {
            config.database = Some(PathBuf::from(database));
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let has_settings = contents.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_settings {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "vct")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_export_format.is_some() {
            self.default_export_format = other.default_export_format;
        }
        if other.max_upload_bytes.is_some() {
            self.max_upload_bytes = other.max_upload_bytes;
        }
        if other.notification_duration_secs.is_some() {
            self.notification_duration_secs = other.notification_duration_secs;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }

    pub fn author(&self) -> String {
        self.author
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string())
    }

    /// Store path, resolved against the workspace root
    pub fn database_path(&self, workspace: &Workspace) -> PathBuf {
        let configured = self
            .database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
        workspace.resolve(&configured)
    }

    pub fn export_format(&self) -> ExportFormat {
        self.default_export_format.unwrap_or_default()
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes.unwrap_or(MAX_UPLOAD_BYTES)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(
            self.notification_duration_secs
                .unwrap_or(DEFAULT_NOTIFICATION_SECS),
        )
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }
}
