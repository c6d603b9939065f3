//! treedoc - Bottom-up README Generator
//!
//! Walks a source tree and writes one `README.md` per source-bearing
//! directory. Children are documented before their parents so a parent's
//! README can summarize and link the documentation beneath it.
//!
//! ## Pipeline
//!
//! 1. **Scan**: classify every directory once ([`tree::DirectoryTree`])
//! 2. **Schedule**: post-order over source folders ([`tree::TraversalScheduler`])
//! 3. **Analyze**: an LLM-backed [`ai::DocumentAnalyzer`] drafts each README
//! 4. **Merge**: prior documentation is carried forward ([`docs::MergeEngine`])
//! 5. **Save**: backup, then atomic replace ([`docs::DocumentStore`])
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use treedoc::{BuildDriver, BuildOptions, Config, LlmAnalyzer};
//! use treedoc::ai::{ProviderConfig, create_provider};
//!
//! let config = Config::default();
//! let provider = create_provider(&ProviderConfig::from(&config.llm))?;
//! let driver = BuildDriver::new(&config, Arc::new(LlmAnalyzer::new(provider)));
//! let report = driver.run(Path::new("."), &BuildOptions::default()).await?;
//! ```
//!
//! ## Modules
//!
//! - [`tree`]: classification, scanning and traversal order
//! - [`docs`]: document loading, merging and persistence
//! - [`ai`]: provider abstraction, prompts and the analyzer
//! - [`build`]: the per-directory driver and its report
//! - [`config`]: layered configuration

pub mod ai;
pub mod build;
pub mod cli;
pub mod config;
pub mod constants;
pub mod docs;
pub mod tree;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use build::{BuildDriver, BuildOptions, BuildReport, DocumentAction};
pub use config::{Config, ConfigLoader};
pub use types::{ErrorCategory, Result, Stage, TreedocError};

pub use ai::{DocumentAnalyzer, LlmAnalyzer, LlmProvider, MergeStrategy};
pub use docs::{DocumentStore, MergeEngine};
pub use tree::{ClassificationRule, DirectoryTree, TraversalScheduler};
