//! Directory classification
//!
//! Decides which files mark a directory as a source folder and which
//! directories are skipped outright.

use std::collections::HashSet;
use std::path::Path;

use crate::config::ClassificationConfig;
use crate::constants::classification as defaults;

use super::DirectoryNode;

/// Recognized extensions, manifest names and excluded directories.
///
/// Built once at startup and shared read-only for the whole run.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    extensions: HashSet<String>,
    filenames: HashSet<String>,
    excluded_dirs: HashSet<String>,
    skip_hidden_dirs: bool,
}

impl Default for ClassificationRule {
    fn default() -> Self {
        Self {
            extensions: defaults::SOURCE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            filenames: defaults::MANIFEST_FILENAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_dirs: defaults::EXCLUDED_DIRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_hidden_dirs: true,
        }
    }
}

impl ClassificationRule {
    /// Built-in sets extended with the configured additions
    pub fn from_config(config: &ClassificationConfig) -> Self {
        let mut rule = Self::default();
        rule.extensions.extend(
            config
                .extra_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase()),
        );
        rule.filenames
            .extend(config.extra_filenames.iter().map(|f| f.to_lowercase()));
        rule.excluded_dirs
            .extend(config.extra_excluded_dirs.iter().cloned());
        rule.skip_hidden_dirs = config.skip_hidden_dirs;
        rule
    }

    /// Whether a file name counts as a source or manifest file
    pub fn is_source_file(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if self.filenames.contains(&lower) {
            return true;
        }

        Path::new(&lower)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(ext))
            .unwrap_or(false)
    }

    /// Whether a directory is skipped together with everything below it
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.is_excluded_name(name) || (self.skip_hidden_dirs && name.starts_with('.'))
    }

    /// Whether a name is in the excluded set itself.
    ///
    /// Hidden-directory skipping applies only below the root, so an explicitly
    /// chosen root is checked against this set alone.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    /// The recognized files handed to analysis.
    ///
    /// Hidden files still make a directory a source folder but are not read.
    pub fn source_files<'a>(&self, files: &'a [String]) -> Vec<&'a str> {
        files
            .iter()
            .map(String::as_str)
            .filter(|name| !name.starts_with('.') && self.is_source_file(name))
            .collect()
    }

    /// Source-folder test for a node whose children are already classified.
    ///
    /// Qualifies on its own files, or through any qualifying child.
    pub fn is_source_folder(&self, node: &DirectoryNode) -> bool {
        if self.is_excluded_name(&node.name) {
            return false;
        }
        node.files.iter().any(|f| self.is_source_file(f))
            || node.children.iter().any(|c| c.is_source_folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn node(name: &str, files: &[&str], children: Vec<DirectoryNode>) -> DirectoryNode {
        let mut node = DirectoryNode {
            path: PathBuf::from("/repo").join(name),
            name: name.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            children,
            is_source_folder: false,
        };
        node.is_source_folder = ClassificationRule::default().is_source_folder(&node);
        node
    }

    #[test]
    fn test_source_extensions() {
        let rule = ClassificationRule::default();
        assert!(rule.is_source_file("main.py"));
        assert!(rule.is_source_file("App.TSX"));
        assert!(rule.is_source_file("settings.yaml"));
        assert!(!rule.is_source_file("notes.txt"));
        assert!(!rule.is_source_file("logo.png"));
        assert!(!rule.is_source_file("README.md"));
    }

    #[test]
    fn test_manifest_names() {
        let rule = ClassificationRule::default();
        assert!(rule.is_source_file("Makefile"));
        assert!(rule.is_source_file("Dockerfile"));
        assert!(rule.is_source_file("requirements.txt"));
        assert!(!rule.is_source_file("LICENSE"));
    }

    #[test]
    fn test_hidden_files_qualify_but_are_not_read() {
        let rule = ClassificationRule::default();
        assert!(rule.is_source_file(".eslintrc.json"));
        assert!(rule.is_source_file(".gitlab-ci.yml"));

        let ci = node("ci", &[".gitlab-ci.yml", "notes.txt"], vec![]);
        assert!(ci.is_source_folder);

        let files = vec![".eslintrc.json".to_string(), "index.ts".to_string()];
        assert_eq!(rule.source_files(&files), vec!["index.ts"]);
    }

    #[test]
    fn test_excluded_dirs() {
        let rule = ClassificationRule::default();
        assert!(rule.is_excluded_dir("node_modules"));
        assert!(rule.is_excluded_dir("__pycache__"));
        assert!(rule.is_excluded_dir(".git"));
        assert!(rule.is_excluded_dir(".idea"));
        assert!(!rule.is_excluded_dir("src"));
    }

    #[test]
    fn test_from_config_extends_sets() {
        let config = ClassificationConfig {
            extra_extensions: vec![".proto".to_string()],
            extra_filenames: vec!["BUILD.bazel".to_string()],
            extra_excluded_dirs: vec!["generated".to_string()],
            skip_hidden_dirs: false,
            respect_gitignore: false,
        };
        let rule = ClassificationRule::from_config(&config);
        assert!(rule.is_source_file("api.proto"));
        assert!(rule.is_source_file("BUILD.bazel"));
        assert!(rule.is_excluded_dir("generated"));
        assert!(!rule.is_excluded_dir(".github"));
        // built-ins are kept
        assert!(rule.is_source_file("main.rs"));
        assert!(rule.is_excluded_dir("target"));
    }

    #[test]
    fn test_propagation_from_child() {
        let pkg = node("pkg", &["mod.go"], vec![]);
        assert!(pkg.is_source_folder);

        let wrapper = node("wrapper", &["notes.txt"], vec![pkg]);
        assert!(wrapper.is_source_folder);

        let empty = node("assets", &["logo.png"], vec![]);
        assert!(!empty.is_source_folder);
    }

    #[test]
    fn test_hidden_name_still_qualifies_as_root() {
        let root = node(".checkout", &["main.rs"], vec![]);
        assert!(root.is_source_folder);
    }

    #[test]
    fn test_excluded_name_never_qualifies() {
        let build = node("build", &["generated.py"], vec![]);
        assert!(!build.is_source_folder);
    }
}
