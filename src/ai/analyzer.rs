//! Document Analyzer
//!
//! The analysis collaborator turns one directory's files and its children's
//! documentation into README prose. [`LlmAnalyzer`] is the provider-backed
//! implementation; tests substitute their own.

use async_trait::async_trait;
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use super::prompt::{SYSTEM_PROMPT, readme_prompt};
use super::provider::SharedProvider;
use crate::config::LlmConfig;
use crate::constants::{analysis, retry};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, TreedocError};

// =============================================================================
// Analysis Input
// =============================================================================

/// How prior documentation is combined with new analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Regenerate, carrying every prior fact into the result
    #[default]
    Preserve,
    /// Keep prior text verbatim and only append new sections
    AppendOnly,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preserve => write!(f, "preserve"),
            Self::AppendOnly => write!(f, "append-only"),
        }
    }
}

/// Documentation of an immediate child directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSummary {
    /// Child directory name
    pub name: String,
    /// Current document text, title line and derived sections removed
    pub text: String,
}

/// A source file handed to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExcerpt {
    pub name: String,
    pub content: String,
    /// Content was cut at the configured limit
    pub truncated: bool,
}

/// Everything the analyzer sees for one directory
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub directory: PathBuf,
    pub name: String,
    /// Path relative to the documented root
    pub relative_path: PathBuf,
    /// Rendered folder tree
    pub folder_tree: String,
    /// Own source files (empty for directories qualifying through children)
    pub files: Vec<FileExcerpt>,
    pub child_summaries: Vec<ChildSummary>,
    /// Existing document text, if any
    pub existing: Option<String>,
    pub strategy: MergeStrategy,
}

// =============================================================================
// Analyzer Trait
// =============================================================================

/// Produces documentation text for one directory
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Generate markdown for the directory described by `input`.
    ///
    /// Any error is an analysis failure for that directory only.
    async fn analyze(&self, input: &AnalysisInput) -> Result<String>;

    /// Name used in logs
    fn name(&self) -> &str;
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Exponential backoff with jitter for retryable provider errors
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first call
    pub max_attempts: u8,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECS),
            backoff_factor: retry::BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Wait before the next attempt
    fn delay(&self, current: Duration, error: &LlmError) -> Duration {
        match error.category {
            ErrorCategory::RateLimit => error.recommended_delay().min(self.max_delay),
            _ => current + random_jitter(current),
        }
    }
}

/// Add random jitter to prevent thundering herd
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}

/// Calculate exponential backoff with cap
fn calculate_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    let next = Duration::from_secs_f32(current.as_secs_f32() * factor);
    std::cmp::min(next, max)
}

// =============================================================================
// LLM Analyzer
// =============================================================================

/// Provider-backed analyzer with retries
pub struct LlmAnalyzer {
    provider: SharedProvider,
    retry: RetryPolicy,
    summary_chars: usize,
}

impl LlmAnalyzer {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            summary_chars: analysis::SUMMARY_CHARS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Characters of each child document included in the prompt
    pub fn with_summary_chars(mut self, summary_chars: usize) -> Self {
        self.summary_chars = summary_chars;
        self
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let response = self.provider.generate(SYSTEM_PROMPT, prompt).await?;
        debug!(
            provider = %self.provider.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            elapsed_ms = response.elapsed.as_millis() as u64,
            "Provider response"
        );

        let text = strip_outer_fence(&response.content).trim().to_string();
        if text.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::Malformed,
                "empty response",
                self.provider.name(),
            )
            .into());
        }
        Ok(text)
    }
}

#[async_trait]
impl DocumentAnalyzer for LlmAnalyzer {
    #[instrument(skip(self, input), fields(dir = %input.relative_path.display()))]
    async fn analyze(&self, input: &AnalysisInput) -> Result<String> {
        let prompt = readme_prompt(input, self.summary_chars);
        let provider = self.provider.name();
        let mut current_delay = self.retry.base_delay;

        for attempt in 1..=self.retry.max_attempts {
            let err = match self.generate_once(&prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            let classified = match &err {
                TreedocError::Llm(e) => e.clone(),
                other => ErrorClassifier::classify(&other.to_string(), provider),
            };

            warn!(
                provider = %provider,
                attempt = attempt,
                category = %classified.category,
                error = %err,
                "Analysis attempt failed"
            );

            if !classified.is_retryable() || attempt == self.retry.max_attempts {
                return Err(TreedocError::analysis(&input.directory, err.to_string()));
            }

            let delay = self.retry.delay(current_delay, &classified);
            debug!(delay_ms = delay.as_millis() as u64, "Retrying after backoff");
            sleep(delay).await;
            current_delay =
                calculate_backoff(current_delay, self.retry.backoff_factor, self.retry.max_delay);
        }

        Err(TreedocError::analysis(
            &input.directory,
            "no attempts configured",
        ))
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

/// Remove a markdown fence wrapped around the whole response
pub fn strip_outer_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    let Some((info, body)) = rest.split_once('\n') else {
        return text;
    };
    if !matches!(info.trim(), "" | "markdown" | "md") {
        return text;
    }
    match body.trim_end().strip_suffix("```") {
        Some(inner) => inner,
        None => text,
    }
}
