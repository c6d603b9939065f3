//! Build Report
//!
//! Per-directory outcomes and failures of one run.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::analysis;
use crate::docs::markdown;
use crate::types::Stage;

/// What happened to a directory's document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    /// No prior content existed
    Created,
    /// Prior content was merged with the new analysis
    Updated,
    /// Prior content was kept verbatim and new sections appended
    Appended,
}

impl std::fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "create"),
            Self::Updated => write!(f, "update"),
            Self::Appended => write!(f, "append"),
        }
    }
}

/// A documented (or, in dry run, computed) directory
#[derive(Debug, Clone)]
pub struct DirectoryOutcome {
    /// Path relative to the root
    pub path: PathBuf,
    /// Path of the document written (or that would be written)
    pub document: PathBuf,
    pub action: DocumentAction,
    /// Backup written during this run
    pub backup: Option<PathBuf>,
    /// Final document text
    pub text: String,
    pub retained: usize,
    pub conflicts: usize,
}

impl DirectoryOutcome {
    /// Short single-line excerpt of the document
    pub fn preview(&self) -> String {
        markdown::truncate_chars(&markdown::normalize(&self.text), analysis::PREVIEW_CHARS)
    }
}

/// A directory that could not be documented
#[derive(Debug, Clone)]
pub struct DirectoryFailure {
    /// Path relative to the root
    pub path: PathBuf,
    pub stage: Stage,
    pub message: String,
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub root: PathBuf,
    pub dry_run: bool,
    /// Outcomes in processing order
    pub outcomes: Vec<DirectoryOutcome>,
    /// Failures in the order they occurred, scan failures first
    pub failures: Vec<DirectoryFailure>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            root,
            dry_run,
            ..Self::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Process exit status: 0 on full success, 2 when some directories failed
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() { 2 } else { 0 }
    }

    pub fn count(&self, action: DocumentAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    pub fn failure(&self, path: impl Into<PathBuf>) -> Option<&DirectoryFailure> {
        let path = path.into();
        self.failures.iter().find(|f| f.path == path)
    }
}
