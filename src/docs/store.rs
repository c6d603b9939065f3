//! Document Store
//!
//! Reads the documentation file of a directory and performs the
//! backup-then-write sequence. `save` is the only mutating operation of a run.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use atomicwrites::{AllowOverwrite, AtomicFile};
use tracing::debug;

use crate::config::DocumentationConfig;
use crate::constants::docs;
use crate::types::{Result, TreedocError};

/// Prior documentation found at a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingDocument {
    pub text: String,
    /// False for an empty or whitespace-only file
    pub had_prior_content: bool,
}

impl ExistingDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let had_prior_content = !text.trim().is_empty();
        Self {
            text,
            had_prior_content,
        }
    }
}

/// What `save` did on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub path: PathBuf,
    /// Backup written during this save, if any
    pub backup: Option<PathBuf>,
    /// Whether a primary document existed before the write
    pub replaced: bool,
}

/// Fixed-name documentation files inside each directory
#[derive(Debug, Clone)]
pub struct DocumentStore {
    file_name: String,
    backup_file_name: String,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(docs::FILE_NAME, docs::BACKUP_FILE_NAME)
    }
}

impl DocumentStore {
    pub fn new(file_name: impl Into<String>, backup_file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            backup_file_name: backup_file_name.into(),
        }
    }

    pub fn from_config(config: &DocumentationConfig) -> Self {
        Self::new(&config.file_name, &config.backup_file_name)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn backup_file_name(&self) -> &str {
        &self.backup_file_name
    }

    pub fn document_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }

    pub fn backup_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.backup_file_name)
    }

    /// Read the existing document, `None` when there is none
    pub fn load(&self, dir: &Path) -> Result<Option<ExistingDocument>> {
        let path = self.document_path(dir);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(ExistingDocument::new(text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TreedocError::load(path, e)),
        }
    }

    /// Back up the current document (optional), then replace it.
    ///
    /// The new text goes to a temporary file in the same directory and is
    /// renamed over the primary path, so a failure at any step leaves the
    /// prior document as it was.
    pub fn save(&self, dir: &Path, text: &str, keep_backup: bool) -> Result<SaveOutcome> {
        let path = self.document_path(dir);
        let replaced = path.is_file();

        let backup = if replaced && keep_backup {
            let backup_path = self.backup_path(dir);
            fs::copy(&path, &backup_path)
                .map_err(|e| TreedocError::persistence(&backup_path, "back up", e))?;
            debug!("Backed up {} to {}", path.display(), backup_path.display());
            Some(backup_path)
        } else {
            None
        };

        AtomicFile::new(&path, AllowOverwrite)
            .write(|f| f.write_all(text.as_bytes()))
            .map_err(|e| {
                let source = match e {
                    atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
                };
                TreedocError::persistence(&path, "write", source)
            })?;

        Ok(SaveOutcome {
            path,
            backup,
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::default();
        assert!(store.load(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_blank_has_no_prior_content() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "  \n\n").unwrap();

        let doc = DocumentStore::default()
            .load(temp_dir.path())
            .unwrap()
            .unwrap();
        assert!(!doc.had_prior_content);
    }

    #[test]
    fn test_save_new_document_writes_no_backup() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::default();

        let outcome = store.save(temp_dir.path(), "# New\n", true).unwrap();
        assert!(!outcome.replaced);
        assert!(outcome.backup.is_none());
        assert!(!temp_dir.path().join("README.md.backup").exists());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("README.md")).unwrap(),
            "# New\n"
        );
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_backup_matches_prior_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let prior = "# Old\r\n\nkept   as-is\u{00e9}\n";
        fs::write(temp_dir.path().join("README.md"), prior).unwrap();
        fs::write(temp_dir.path().join("README.md.backup"), "stale backup").unwrap();

        let store = DocumentStore::default();
        let outcome = store.save(temp_dir.path(), "# Merged\n", true).unwrap();

        assert!(outcome.replaced);
        assert_eq!(
            outcome.backup.as_deref(),
            Some(temp_dir.path().join("README.md.backup").as_path())
        );
        assert_eq!(
            fs::read(temp_dir.path().join("README.md.backup")).unwrap(),
            prior.as_bytes()
        );
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("README.md")).unwrap(),
            "# Merged\n"
        );
    }

    #[test]
    fn test_no_backup_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Old\n").unwrap();

        let outcome = DocumentStore::default()
            .save(temp_dir.path(), "# New\n", false)
            .unwrap();
        assert!(outcome.replaced);
        assert!(outcome.backup.is_none());
        assert!(!temp_dir.path().join("README.md.backup").exists());
    }

    #[test]
    fn test_custom_file_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::new("DOCS.md", "DOCS.md.bak");
        fs::write(temp_dir.path().join("DOCS.md"), "old").unwrap();

        store.save(temp_dir.path(), "new", true).unwrap();
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("DOCS.md.bak")).unwrap(),
            "old"
        );
        assert_eq!(store.load(temp_dir.path()).unwrap().unwrap().text, "new");
    }

    #[test]
    fn test_failed_save_reports_persistence_stage() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");

        let err = DocumentStore::default()
            .save(&missing, "# New\n", true)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Persistence));
        assert!(!missing.exists());
    }
}
