//! Directory Tree
//!
//! One-pass snapshot of the documented tree:
//!
//! - [`ClassificationRule`]: which files and directories count
//! - [`DirectoryTree::scan`]: enumerate and classify every directory once
//! - [`TraversalScheduler`]: bottom-up (post-order) processing order
//! - [`render_folder_tree`]: indented listing handed to the analyzer

mod classifier;
mod gitignore;
mod render;
mod scheduler;

pub use classifier::ClassificationRule;
pub use gitignore::GitIgnoreFilter;
pub use render::render_folder_tree;
pub use scheduler::TraversalScheduler;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::{Result, TreedocError};

/// A directory in the scanned tree
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    /// Absolute path (identity)
    pub path: PathBuf,
    /// Final path component
    pub name: String,
    /// Regular files directly inside, sorted by name
    pub files: Vec<String>,
    /// Non-excluded subdirectories, sorted by name
    pub children: Vec<DirectoryNode>,
    pub is_source_folder: bool,
}

impl DirectoryNode {
    /// Immediate children that are source folders
    pub fn source_children(&self) -> impl Iterator<Item = &DirectoryNode> {
        self.children.iter().filter(|c| c.is_source_folder)
    }
}

/// Subtree skipped because it could not be listed
#[derive(Debug)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub error: TreedocError,
}

/// Classified snapshot of a directory tree
#[derive(Debug)]
pub struct DirectoryTree {
    pub root: DirectoryNode,
    pub warnings: Vec<ScanWarning>,
}

impl DirectoryTree {
    /// Scan and classify the tree under `root`.
    ///
    /// Fails only when the root itself is missing, not a directory, or
    /// unreadable. Unreadable subdirectories become empty leaves and are
    /// listed in `warnings`.
    pub fn scan(root: &Path, rule: &ClassificationRule) -> Result<Self> {
        Self::scan_with_filter(root, rule, &GitIgnoreFilter::disabled())
    }

    pub fn scan_with_filter(
        root: &Path,
        rule: &ClassificationRule,
        filter: &GitIgnoreFilter,
    ) -> Result<Self> {
        Self::scan_with(root, rule, filter, &list_dir)
    }

    /// Scan with a custom directory listing
    pub(crate) fn scan_with(
        root: &Path,
        rule: &ClassificationRule,
        filter: &GitIgnoreFilter,
        list: &dyn Fn(&Path) -> io::Result<Vec<Entry>>,
    ) -> Result<Self> {
        let metadata = match fs::metadata(root) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TreedocError::RootNotFound(root.to_path_buf()));
            }
            Err(e) => return Err(TreedocError::classification(root, e)),
        };
        if !metadata.is_dir() {
            return Err(TreedocError::NotADirectory(root.to_path_buf()));
        }

        let root = root
            .canonicalize()
            .map_err(|e| TreedocError::classification(root, e))?;

        let mut scanner = Scanner {
            rule,
            filter,
            list,
            warnings: Vec::new(),
        };

        let name = dir_name(&root);
        let root_node = if rule.is_excluded_name(&name) {
            warn!("Root {} has an excluded name; nothing to document", root.display());
            DirectoryNode {
                path: root,
                name,
                files: Vec::new(),
                children: Vec::new(),
                is_source_folder: false,
            }
        } else {
            // The root must be listable; deeper failures are recoverable.
            let entries = list(&root).map_err(|e| TreedocError::classification(&root, e))?;
            scanner.build_node(root, name, entries)
        };

        Ok(Self {
            root: root_node,
            warnings: scanner.warnings,
        })
    }

    /// Path of a node relative to the root ("." for the root itself)
    pub fn relative_path(&self, node: &DirectoryNode) -> PathBuf {
        match node.path.strip_prefix(&self.root.path) {
            Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
            Ok(rel) => rel.to_path_buf(),
            Err(_) => node.path.clone(),
        }
    }
}

struct Scanner<'a> {
    rule: &'a ClassificationRule,
    filter: &'a GitIgnoreFilter,
    list: &'a dyn Fn(&Path) -> io::Result<Vec<Entry>>,
    warnings: Vec<ScanWarning>,
}

pub(crate) enum Entry {
    File(String),
    Dir(String),
}

impl Scanner<'_> {
    fn build_node(&mut self, path: PathBuf, name: String, entries: Vec<Entry>) -> DirectoryNode {
        let mut files = Vec::new();
        let mut children = Vec::new();

        for entry in entries {
            match entry {
                Entry::File(file) => {
                    if !self.filter.is_ignored(&path.join(&file), false) {
                        files.push(file);
                    }
                }
                Entry::Dir(dir) => {
                    let child_path = path.join(&dir);
                    if self.rule.is_excluded_dir(&dir)
                        || self.filter.is_ignored(&child_path, true)
                    {
                        debug!("Skipping excluded directory {}", child_path.display());
                        continue;
                    }
                    children.push(self.scan_child(child_path, dir));
                }
            }
        }

        let mut node = DirectoryNode {
            path,
            name,
            files,
            children,
            is_source_folder: false,
        };
        node.is_source_folder = self.rule.is_source_folder(&node);
        node
    }

    fn scan_child(&mut self, path: PathBuf, name: String) -> DirectoryNode {
        match (self.list)(&path) {
            Ok(entries) => self.build_node(path, name, entries),
            Err(e) => {
                let error = TreedocError::classification(&path, e);
                warn!(stage = "classification", "{}; skipping subtree", error);
                self.warnings.push(ScanWarning {
                    path: path.clone(),
                    error,
                });
                DirectoryNode {
                    path,
                    name,
                    files: Vec::new(),
                    children: Vec::new(),
                    is_source_folder: false,
                }
            }
        }
    }
}

/// List a directory once, sorted by name. Symlinked directories are not
/// followed; symlinked files count as files.
pub(crate) fn list_dir(path: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            entries.push(Entry::Dir(name));
        } else if file_type.is_file() {
            entries.push(Entry::File(name));
        } else if file_type.is_symlink()
            && fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false)
        {
            entries.push(Entry::File(name));
        }
    }

    entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));
    Ok(entries)
}

fn entry_name(entry: &Entry) -> &str {
    match entry {
        Entry::File(name) | Entry::Dir(name) => name,
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let result = DirectoryTree::scan(&missing, &ClassificationRule::default());
        assert!(matches!(result, Err(TreedocError::RootNotFound(_))));
    }

    #[test]
    fn test_scan_file_root() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "main.py");
        let result = DirectoryTree::scan(
            &temp_dir.path().join("main.py"),
            &ClassificationRule::default(),
        );
        assert!(matches!(result, Err(TreedocError::NotADirectory(_))));
    }

    #[test]
    fn test_scan_sorts_and_excludes() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "zeta/z.py");
        touch(temp_dir.path(), "alpha/a.py");
        touch(temp_dir.path(), "node_modules/lib/index.js");
        touch(temp_dir.path(), ".git/hooks/pre-commit.sh");
        touch(temp_dir.path(), "b.txt");
        touch(temp_dir.path(), "a.txt");

        let tree = DirectoryTree::scan(temp_dir.path(), &ClassificationRule::default()).unwrap();
        let names: Vec<_> = tree.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(tree.root.files, vec!["a.txt", "b.txt"]);
        assert!(tree.root.is_source_folder);
        assert!(tree.warnings.is_empty());
    }

    #[test]
    fn test_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg/sub/mod.rs");

        let tree = DirectoryTree::scan(temp_dir.path(), &ClassificationRule::default()).unwrap();
        let sub = &tree.root.children[0].children[0];
        assert_eq!(tree.relative_path(sub), PathBuf::from("pkg/sub"));
        assert_eq!(tree.relative_path(&tree.root), PathBuf::from("."));
    }

    #[test]
    fn test_gitignore_filter() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "generated/out.py");
        touch(temp_dir.path(), "src/lib.rs");
        fs::write(temp_dir.path().join(".gitignore"), "generated/\n").unwrap();

        let root = temp_dir.path().canonicalize().unwrap();
        let filter = GitIgnoreFilter::new(&root);
        let tree =
            DirectoryTree::scan_with_filter(&root, &ClassificationRule::default(), &filter)
                .unwrap();
        let names: Vec<_> = tree.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["src"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dirs_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "real/main.go");
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("real/loop")).unwrap();

        let tree = DirectoryTree::scan(temp_dir.path(), &ClassificationRule::default()).unwrap();
        let real = &tree.root.children[0];
        assert_eq!(real.name, "real");
        assert!(real.children.is_empty());
        assert_eq!(real.files, vec!["main.go"]);
    }
}
