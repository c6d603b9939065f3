use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

use tracing::warn;

/// Root `.gitignore` matcher used when `respect_gitignore` is enabled
pub struct GitIgnoreFilter {
    gitignore: Option<Gitignore>,
}

impl GitIgnoreFilter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let gitignore_path = root.as_ref().join(".gitignore");

        let gitignore = if gitignore_path.exists() {
            let mut builder = GitignoreBuilder::new(root.as_ref());
            if let Some(err) = builder.add(&gitignore_path) {
                warn!("Partially parsed {}: {}", gitignore_path.display(), err);
            }
            builder.build().ok()
        } else {
            None
        };

        Self { gitignore }
    }

    /// A filter that ignores nothing
    pub fn disabled() -> Self {
        Self { gitignore: None }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        match &self.gitignore {
            Some(gi) => gi.matched(path, is_dir).is_ignore(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_matches_root_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".gitignore"), "generated/\n*.log\n").unwrap();

        let filter = GitIgnoreFilter::new(temp_dir.path());
        assert!(filter.is_ignored(&temp_dir.path().join("generated"), true));
        assert!(filter.is_ignored(&temp_dir.path().join("run.log"), false));
        assert!(!filter.is_ignored(&temp_dir.path().join("src"), true));
    }

    #[test]
    fn test_disabled_ignores_nothing() {
        let filter = GitIgnoreFilter::disabled();
        assert!(!filter.is_ignored(Path::new("/any/generated"), true));
    }
}
