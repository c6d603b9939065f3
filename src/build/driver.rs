//! Build Driver
//!
//! Runs the per-directory pipeline in bottom-up order:
//!
//! 1. Gather the directory's own source files
//! 2. Gather summaries of its immediate source-folder children
//! 3. Load the existing document
//! 4. Analyze
//! 5. Merge
//! 6. Save (or, in dry run, record the would-be text)
//!
//! A failure in steps 3-6 skips that directory only.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::report::{BuildReport, DirectoryFailure, DirectoryOutcome, DocumentAction};
use crate::ai::{AnalysisInput, ChildSummary, DocumentAnalyzer, FileExcerpt, MergeStrategy};
use crate::config::{Config, DocumentationConfig};
use crate::docs::{DocumentStore, MergeEngine, markdown, strip_children_section};
use crate::tree::{
    ClassificationRule, DirectoryNode, DirectoryTree, GitIgnoreFilter, TraversalScheduler,
    render_folder_tree,
};
use crate::types::{Result, Stage, TreedocError};

/// Per-run switches
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Compute every document without touching the filesystem
    pub dry_run: bool,
    /// Copy the prior document to the backup path before replacing it
    pub keep_backup: bool,
    pub strategy: MergeStrategy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            keep_backup: true,
            strategy: MergeStrategy::Preserve,
        }
    }
}

/// Orchestrates one documentation run over a tree
pub struct BuildDriver {
    rule: ClassificationRule,
    respect_gitignore: bool,
    store: DocumentStore,
    merger: MergeEngine,
    docs: DocumentationConfig,
    analyzer: Arc<dyn DocumentAnalyzer>,
}

impl BuildDriver {
    pub fn new(config: &Config, analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        let docs = config.documentation.clone();
        Self {
            rule: ClassificationRule::from_config(&config.classification),
            respect_gitignore: config.classification.respect_gitignore,
            store: DocumentStore::from_config(&docs),
            merger: MergeEngine::new(&docs.file_name, docs.excerpt_chars),
            docs,
            analyzer,
        }
    }

    /// Document every source folder under `root`, children before parents.
    ///
    /// Returns an error only when the root itself cannot be scanned; every
    /// other failure lands in the report.
    #[instrument(skip_all, fields(root = %root.display(), dry_run = options.dry_run))]
    pub async fn run(&self, root: &Path, options: &BuildOptions) -> Result<BuildReport> {
        let start = Instant::now();

        let filter = if self.respect_gitignore {
            GitIgnoreFilter::new(root.canonicalize().unwrap_or_else(|_| root.to_path_buf()))
        } else {
            GitIgnoreFilter::disabled()
        };
        let tree = DirectoryTree::scan_with_filter(root, &self.rule, &filter)?;

        let mut report = self.document_tree(&tree, options).await;
        report.duration = start.elapsed();
        info!(
            "Finished: {} documented, {} failed in {:.1}s",
            report.outcomes.len(),
            report.failures.len(),
            report.duration.as_secs_f32()
        );
        Ok(report)
    }

    /// Document every source folder of a scanned tree. Scan warnings are
    /// reported as classification failures.
    async fn document_tree(&self, tree: &DirectoryTree, options: &BuildOptions) -> BuildReport {
        let mut report = BuildReport::new(tree.root.path.clone(), options.dry_run);

        for warning in &tree.warnings {
            if let Some(stage) = warning.error.stage() {
                report.failures.push(DirectoryFailure {
                    path: relative_to(&tree.root.path, &warning.path),
                    stage,
                    message: warning.error.to_string(),
                });
            }
        }

        let schedule = TraversalScheduler::schedule(tree);
        info!(
            "Documenting {} directories with {} ({} strategy)",
            schedule.len(),
            self.analyzer.name(),
            options.strategy
        );

        // Text each directory ended up with in this run, keyed by absolute path
        let mut finalized: HashMap<PathBuf, String> = HashMap::new();

        for node in schedule {
            let relative = tree.relative_path(node);
            match self.document(node, &relative, options, &finalized).await {
                Ok(outcome) => {
                    info!("{} {}", outcome.action, outcome.document.display());
                    finalized.insert(node.path.clone(), outcome.text.clone());
                    report.outcomes.push(outcome);
                }
                Err(err) => {
                    let stage = err.stage().unwrap_or(Stage::Analysis);
                    warn!(stage = %stage, "Skipping {}: {}", relative.display(), err);
                    report.failures.push(DirectoryFailure {
                        path: relative,
                        stage,
                        message: err.to_string(),
                    });
                }
            }
        }

        report
    }

    #[instrument(skip_all, fields(dir = %relative.display()))]
    async fn document(
        &self,
        node: &DirectoryNode,
        relative: &Path,
        options: &BuildOptions,
        finalized: &HashMap<PathBuf, String>,
    ) -> Result<DirectoryOutcome> {
        let files = self.read_sources(node);
        let children = self.child_summaries(node, finalized);
        let existing = self.store.load(&node.path)?;

        let omit = [self.store.backup_file_name()];
        let input = AnalysisInput {
            directory: node.path.clone(),
            name: node.name.clone(),
            relative_path: relative.to_path_buf(),
            folder_tree: render_folder_tree(node, self.docs.tree_depth, &omit),
            files,
            child_summaries: children,
            existing: existing
                .as_ref()
                .filter(|doc| doc.had_prior_content)
                .map(|doc| strip_children_section(&doc.text)),
            strategy: options.strategy,
        };

        let generated = self.analyzer.analyze(&input).await.map_err(|err| match err {
            e @ TreedocError::Analysis { .. } => e,
            other => TreedocError::analysis(&node.path, other.to_string()),
        })?;

        let merged = self.merger.merge(
            existing.as_ref(),
            &generated,
            &input.child_summaries,
            options.strategy,
        );

        let had_prior = existing.as_ref().is_some_and(|doc| doc.had_prior_content);
        let action = match (had_prior, options.strategy) {
            (false, _) => DocumentAction::Created,
            (true, MergeStrategy::Preserve) => DocumentAction::Updated,
            (true, MergeStrategy::AppendOnly) => DocumentAction::Appended,
        };
        if merged.retained > 0 || merged.conflicts > 0 {
            debug!(
                retained = merged.retained,
                conflicts = merged.conflicts,
                "Carried prior content forward"
            );
        }

        let document = self.store.document_path(&node.path);
        let backup = if options.dry_run {
            None
        } else {
            self.store
                .save(&node.path, &merged.text, options.keep_backup)?
                .backup
        };

        Ok(DirectoryOutcome {
            path: relative.to_path_buf(),
            document,
            action,
            backup,
            text: merged.text,
            retained: merged.retained,
            conflicts: merged.conflicts,
        })
    }

    /// The directory's own recognized files, content truncated.
    ///
    /// Oversized, unreadable and non-UTF-8 files are left out of the input;
    /// they still show in the folder tree.
    fn read_sources(&self, node: &DirectoryNode) -> Vec<FileExcerpt> {
        let mut excerpts = Vec::new();

        for name in self.rule.source_files(&node.files) {
            let path = node.path.join(name);
            match fs::metadata(&path) {
                Ok(m) if m.len() > self.docs.max_file_size => {
                    debug!("Skipping large file {} ({} bytes)", path.display(), m.len());
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            }

            let content = match fs::read(&path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        debug!("Skipping non-UTF-8 file {}", path.display());
                        continue;
                    }
                },
                Err(e) => {
                    warn!("Cannot read {}: {}", path.display(), e);
                    continue;
                }
            };

            let truncated = content.chars().count() > self.docs.max_file_chars;
            let content = if truncated {
                content.chars().take(self.docs.max_file_chars).collect()
            } else {
                content
            };

            excerpts.push(FileExcerpt {
                name: name.to_string(),
                content,
                truncated,
            });
        }

        excerpts
    }

    /// Summaries of the immediate source-folder children.
    ///
    /// Prefers the text finalized earlier in this run and falls back to the
    /// document on disk. Children without any document are left out.
    fn child_summaries(
        &self,
        node: &DirectoryNode,
        finalized: &HashMap<PathBuf, String>,
    ) -> Vec<ChildSummary> {
        node.source_children()
            .filter_map(|child| {
                let text = match finalized.get(&child.path) {
                    Some(text) => text.clone(),
                    None => match self.store.load(&child.path) {
                        Ok(Some(doc)) if doc.had_prior_content => doc.text,
                        Ok(_) => return None,
                        Err(e) => {
                            warn!("{}", e);
                            return None;
                        }
                    },
                };
                let text = strip_children_section(&text);
                Some(ChildSummary {
                    name: child.name.clone(),
                    text: markdown::strip_title(&text).trim().to_string(),
                })
            })
            .collect()
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Deterministic analyzer recording the order of requests
    #[derive(Default)]
    struct StubAnalyzer {
        fail_on: Option<PathBuf>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl StubAnalyzer {
        fn failing_on(path: &str) -> Self {
            Self {
                fail_on: Some(PathBuf::from(path)),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<PathBuf> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentAnalyzer for StubAnalyzer {
        async fn analyze(&self, input: &AnalysisInput) -> Result<String> {
            self.calls.lock().unwrap().push(input.relative_path.clone());
            if self.fail_on.as_ref() == Some(&input.relative_path) {
                return Err(TreedocError::analysis(&input.directory, "quota exceeded"));
            }
            let files: Vec<_> = input.files.iter().map(|f| f.name.as_str()).collect();
            Ok(format!(
                "# {}\n\nHandles the {} directory.\n\nFiles: {}.",
                input.name,
                input.relative_path.display(),
                files.join(", ")
            ))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// root/{a/{x.py}, b/{y.js, c/{z.go}}}
    fn scenario() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap().join("repo");
        touch(&root, "a/x.py", "print('x')\n");
        touch(&root, "b/y.js", "export const y = 1;\n");
        touch(&root, "b/c/z.go", "package c\n");
        (temp_dir, root)
    }

    fn driver(analyzer: Arc<StubAnalyzer>) -> BuildDriver {
        BuildDriver::new(&Config::default(), analyzer)
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    files.insert(path.clone(), fs::read(&path).unwrap());
                }
            }
        }
        files
    }

    #[tokio::test]
    async fn test_children_before_parents() {
        let (_temp, root) = scenario();
        let analyzer = Arc::new(StubAnalyzer::default());

        let report = driver(analyzer.clone())
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();

        let expected: Vec<PathBuf> = ["a", "b/c", "b", "."].iter().map(PathBuf::from).collect();
        assert_eq!(analyzer.calls(), expected);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.count(DocumentAction::Created), 4);

        let root_doc = fs::read_to_string(root.join("README.md")).unwrap();
        assert!(root_doc.contains("- [`a`](a/README.md): Handles the a directory."));
        assert!(root_doc.contains("- [`b`](b/README.md)"));
        let b_doc = fs::read_to_string(root.join("b/README.md")).unwrap();
        assert!(b_doc.contains("- [`c`](c/README.md): Handles the b/c directory."));
    }

    #[tokio::test]
    async fn test_analysis_failure_skips_only_that_directory() {
        let (_temp, root) = scenario();
        let analyzer = Arc::new(StubAnalyzer::failing_on("b/c"));

        let report = driver(analyzer)
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();

        assert!(root.join("a/README.md").exists());
        assert!(root.join("b/README.md").exists());
        assert!(!root.join("b/c/README.md").exists());

        let failure = report.failure("b/c").unwrap();
        assert_eq!(failure.stage, Stage::Analysis);
        assert!(failure.message.contains("quota exceeded"));
        assert_eq!(report.exit_code(), 2);

        let b_doc = fs::read_to_string(root.join("b/README.md")).unwrap();
        assert!(!b_doc.contains("c/README.md"));
    }

    #[tokio::test]
    async fn test_unlistable_directory_is_a_classification_failure() {
        let (_temp, root) = scenario();
        touch(&root, "locked/secret.py", "TOKEN = 1\n");
        let driver = driver(Arc::new(StubAnalyzer::default()));

        let list = |path: &Path| {
            if path.ends_with("locked") {
                Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                ))
            } else {
                crate::tree::list_dir(path)
            }
        };
        let tree =
            DirectoryTree::scan_with(&root, &driver.rule, &GitIgnoreFilter::disabled(), &list)
                .unwrap();
        assert_eq!(tree.warnings.len(), 1);

        let report = driver.document_tree(&tree, &BuildOptions::default()).await;

        let failure = report.failure("locked").unwrap();
        assert_eq!(failure.stage, Stage::Classification);
        assert!(failure.message.contains("permission denied"));
        assert_eq!(report.exit_code(), 2);

        assert_eq!(report.outcomes.len(), 4);
        assert!(root.join("a/README.md").exists());
        assert!(root.join("b/c/README.md").exists());
        assert!(!root.join("locked/README.md").exists());
        let root_doc = fs::read_to_string(root.join("README.md")).unwrap();
        assert!(!root_doc.contains("locked"));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_prior_document() {
        let (_temp, root) = scenario();
        let prior = "# B\n\nHand-written notes.\n";
        touch(&root, "b/README.md", prior);
        // A directory in the backup's place makes the backup copy fail
        fs::create_dir_all(root.join("b/README.md.backup")).unwrap();

        let report = driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();

        let failure = report.failure("b").unwrap();
        assert_eq!(failure.stage, Stage::Persistence);
        assert_eq!(report.exit_code(), 2);
        assert_eq!(fs::read(root.join("b/README.md")).unwrap(), prior.as_bytes());

        assert!(root.join("a/README.md").exists());
        assert!(root.join("b/c/README.md").exists());
        let root_doc = fs::read_to_string(root.join("README.md")).unwrap();
        assert!(root_doc.contains("- [`b`](b/README.md): Hand-written notes."));
    }

    #[tokio::test]
    async fn test_dry_run_mutates_nothing_and_matches_real_run() {
        let (_temp, root) = scenario();
        touch(&root, "a/README.md", "# A\n\nLegacy fact about caching.\n");
        let before = snapshot(&root);

        let options = BuildOptions {
            dry_run: true,
            ..BuildOptions::default()
        };
        let preview = driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &options)
            .await
            .unwrap();
        assert_eq!(snapshot(&root), before);
        assert!(preview.outcomes.iter().all(|o| o.backup.is_none()));

        let real = driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();
        assert_eq!(real.outcomes.len(), preview.outcomes.len());
        for outcome in &preview.outcomes {
            let written = fs::read_to_string(&outcome.document).unwrap();
            assert_eq!(written, outcome.text, "{}", outcome.path.display());
        }
    }

    #[tokio::test]
    async fn test_backup_and_retained_content() {
        let (_temp, root) = scenario();
        let prior = "# A\n\nLegacy fact about caching.\n";
        touch(&root, "a/README.md", prior);

        let report = driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();

        let a = report.outcomes.iter().find(|o| o.path == Path::new("a")).unwrap();
        assert_eq!(a.action, DocumentAction::Updated);
        assert_eq!(a.backup.as_deref(), Some(root.join("a/README.md.backup").as_path()));
        assert_eq!(fs::read(root.join("a/README.md.backup")).unwrap(), prior.as_bytes());

        let written = fs::read_to_string(root.join("a/README.md")).unwrap();
        assert_eq!(written, a.text);
        assert!(written.contains("Legacy fact about caching."));
    }

    #[tokio::test]
    async fn test_no_backup_option() {
        let (_temp, root) = scenario();
        touch(&root, "a/README.md", "# A\n\nOld.\n");

        let options = BuildOptions {
            keep_backup: false,
            ..BuildOptions::default()
        };
        driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &options)
            .await
            .unwrap();
        assert!(!root.join("a/README.md.backup").exists());
    }

    #[tokio::test]
    async fn test_second_run_is_stable() {
        let (_temp, root) = scenario();
        touch(&root, "b/README.md", "# B\n\n- `y.js`: exports the y constant\n");

        driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();
        let first = fs::read_to_string(root.join("b/README.md")).unwrap();
        let first_root = fs::read_to_string(root.join("README.md")).unwrap();

        driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &BuildOptions::default())
            .await
            .unwrap();
        let second = fs::read_to_string(root.join("b/README.md")).unwrap();

        assert_eq!(first, second);
        assert!(second.contains("exports the y constant"));
        assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), first_root);
    }

    #[tokio::test]
    async fn test_append_only_keeps_prior_text_verbatim() {
        let (_temp, root) = scenario();
        let prior = "# A\n\nHand-written   notes, odd spacing kept.\n";
        touch(&root, "a/README.md", prior);

        let options = BuildOptions {
            strategy: MergeStrategy::AppendOnly,
            ..BuildOptions::default()
        };
        let report = driver(Arc::new(StubAnalyzer::default()))
            .run(&root, &options)
            .await
            .unwrap();

        let written = fs::read_to_string(root.join("a/README.md")).unwrap();
        assert!(written.starts_with(prior.trim_end()));
        assert!(written.contains("Handles the a directory."));
        assert_eq!(report.count(DocumentAction::Appended), 1);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let result = driver(Arc::new(StubAnalyzer::default()))
            .run(&temp_dir.path().join("nope"), &BuildOptions::default())
            .await;
        assert!(matches!(result, Err(TreedocError::RootNotFound(_))));
    }

    #[tokio::test]
    async fn test_files_are_truncated_for_the_analyzer() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("repo");
        touch(&root, "main.py", &"x".repeat(50));
        fs::write(root.join("blob.py"), [0xff, 0xfe, 0x00]).unwrap();

        let mut config = Config::default();
        config.documentation.max_file_chars = 10;
        let driver = BuildDriver::new(&config, Arc::new(StubAnalyzer::default()));
        let tree = DirectoryTree::scan(&root, &driver.rule).unwrap();

        let files = driver.read_sources(&tree.root);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "main.py");
        assert_eq!(files[0].content.len(), 10);
        assert!(files[0].truncated);
    }
}
