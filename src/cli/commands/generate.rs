//! Generate Command
//!
//! Documents every source folder under a root, children before parents.
//!
//! Usage:
//!   treedoc <ROOT> [--dry-run] [--no-backup] [--append-only]
//!                  [--provider NAME] [--model NAME] [--config FILE]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::ai::{LlmAnalyzer, MergeStrategy, ProviderConfig, RetryPolicy, create_provider};
use crate::build::{BuildDriver, BuildOptions, BuildReport};
use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::{Result, TreedocError};

/// Generate command options
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub root: PathBuf,
    /// Explicit config file replacing the project config
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub no_backup: bool,
    pub append_only: bool,
    /// LLM provider override
    pub provider: Option<String>,
    /// Model override
    pub model: Option<String>,
}

impl GenerateOptions {
    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            dry_run: self.dry_run,
            keep_backup: !self.no_backup,
            strategy: if self.append_only {
                MergeStrategy::AppendOnly
            } else {
                MergeStrategy::Preserve
            },
        }
    }

    /// Apply CLI overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
    }
}

/// Run the generate command, returning the process exit status
pub fn run(options: GenerateOptions, output: &Output) -> Result<u8> {
    check_root(&options.root)?;

    let mut config = ConfigLoader::load(&options.root, options.config.as_deref())?;
    options.apply(&mut config);
    config.validate()?;

    // Missing credentials fail here, before any directory is visited.
    let provider = create_provider(&ProviderConfig::from(&config.llm))?;
    info!(
        "Using LLM provider: {} (model: {})",
        provider.name(),
        provider.model()
    );

    let analyzer = LlmAnalyzer::new(provider)
        .with_retry(RetryPolicy::from_config(&config.llm))
        .with_summary_chars(config.documentation.summary_chars);
    let driver = BuildDriver::new(&config, Arc::new(analyzer));
    let build_options = options.build_options();

    if build_options.dry_run {
        output.header("Dry run: nothing will be written");
    } else {
        output.header(&format!("Documenting {}", options.root.display()));
    }

    let rt = Runtime::new()?;
    let report = rt.block_on(run_until_interrupted(
        &driver,
        &options.root,
        &build_options,
    ))?;

    output.report(&report);
    Ok(report.exit_code() as u8)
}

/// Run the build, stopping at the next analyzer await on Ctrl-C.
///
/// Saves are synchronous, so an interrupted run leaves every directory either
/// fully written or untouched.
async fn run_until_interrupted(
    driver: &BuildDriver,
    root: &Path,
    options: &BuildOptions,
) -> Result<BuildReport> {
    tokio::select! {
        result = driver.run(root, options) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; directories already written are complete");
            Err(TreedocError::Interrupted)
        }
    }
}

fn check_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(TreedocError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(TreedocError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}
