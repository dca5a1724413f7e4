//! Import progress tracking
//!
//! Stages only move forward. Observers see a snapshot after every change.

use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Stages of an import run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStage {
    Uploading,
    Parsing,
    Validating,
    Importing,
    Complete,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStage::Uploading => write!(f, "uploading"),
            ImportStage::Parsing => write!(f, "parsing"),
            ImportStage::Validating => write!(f, "validating"),
            ImportStage::Importing => write!(f, "importing"),
            ImportStage::Complete => write!(f, "complete"),
        }
    }
}

/// Snapshot of an import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    pub stage: ImportStage,
    pub processed: usize,
    pub total: usize,
    pub failure_count: usize,
    pub message: String,
}

impl ImportProgress {
    /// Rounded percentage of rows processed
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return if self.stage == ImportStage::Complete { 100 } else { 0 };
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }
}

impl Default for ImportProgress {
    fn default() -> Self {
        Self {
            stage: ImportStage::Uploading,
            processed: 0,
            total: 0,
            failure_count: 0,
            message: String::new(),
        }
    }
}

/// Progress observer callback
pub type ProgressCallback<'a> = Box<dyn FnMut(&ImportProgress) + 'a>;

/// Owns the progress state of one import run
#[derive(Default)]
pub struct ProgressTracker<'a> {
    state: ImportProgress,
    observer: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl FnMut(&ImportProgress) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &ImportProgress {
        &self.state
    }

    /// Move to `stage`; returns false and changes nothing if that would go backwards
    pub fn advance(&mut self, stage: ImportStage, message: impl Into<String>) -> bool {
        if stage < self.state.stage {
            debug!(current = %self.state.stage, requested = %stage, "ignoring stage regression");
            return false;
        }
        if stage != self.state.stage {
            debug!(from = %self.state.stage, to = %stage, "import stage changed");
        }
        self.state.stage = stage;
        self.state.message = message.into();
        self.notify();
        true
    }

    pub fn set_total(&mut self, total: usize) {
        self.state.total = total;
    }

    /// Count one finished row
    pub fn record_row(&mut self, failed: bool, message: impl Into<String>) {
        self.state.processed += 1;
        if failed {
            self.state.failure_count += 1;
        }
        self.state.message = message.into();
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.state);
        }
    }
}
