//! AI Integration Layer
//!
//! Provider abstraction, prompt construction and the analyzer that turns a
//! directory into README prose.

pub mod analyzer;
pub mod prompt;
pub mod provider;

pub use analyzer::{
    AnalysisInput, ChildSummary, DocumentAnalyzer, FileExcerpt, LlmAnalyzer, MergeStrategy,
    RetryPolicy,
};
pub use prompt::{PromptBuilder, PromptSection, SYSTEM_PROMPT};
pub use provider::{
    ClaudeCodeProvider, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ProviderConfig,
    SharedProvider, TokenUsage, create_provider,
};
