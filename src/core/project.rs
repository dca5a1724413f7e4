//! Workspace discovery and structure

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks a workspace root
pub const WORKSPACE_DIR: &str = ".vct";

/// Represents a content workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .vct/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create the workspace structure at the given path
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let vct_dir = root.join(WORKSPACE_DIR);
        if vct_dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(vct_dir.join("mappings"))
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(vct_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Content workspace configuration

# Author stamped on imported documents that have none
# author: Admin

# Record store, relative to the workspace root
# database: .vct/content.db

# Default export format (csv, json, spreadsheet)
# default_export_format: csv

# Largest accepted import file, in bytes
# max_upload_bytes: 10485760

# Seconds a notification stays visible
# notification_duration_secs: 5

# Log filter used when VCT_LOG is unset (error, warn, info, debug, trace)
# log_level: warn
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .vct configuration directory
    pub fn vct_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Directory holding saved mapping files
    pub fn mappings_dir(&self) -> PathBuf {
        self.vct_dir().join("mappings")
    }

    /// Resolve a configured path against the workspace root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a content workspace (searched from {searched_from:?})")]
    #[diagnostic(code(vct::workspace::not_found), help("run 'vct init' to create one"))]
    NotFound { searched_from: PathBuf },

    #[error("workspace already exists at {0:?}")]
    #[diagnostic(code(vct::workspace::exists), help("use --force to rewrite its config"))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(vct::workspace::io))]
    IoError(String),
}
