//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/treedoc/) and project (<root>/.treedoc.toml) level configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{analysis, docs, network, retry};
use crate::types::{Result, TreedocError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings
    pub llm: LlmConfig,

    /// Directory classification settings
    pub classification: ClassificationConfig,

    /// Documentation output settings
    pub documentation: DocumentationConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TreedocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(TreedocError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_attempts == 0 {
            return Err(TreedocError::Config(
                "LLM max_attempts must be at least 1".to_string(),
            ));
        }

        let doc = &self.documentation;
        if doc.file_name.trim().is_empty() || doc.file_name.contains(['/', '\\']) {
            return Err(TreedocError::Config(format!(
                "documentation.file_name must be a plain file name, got '{}'",
                doc.file_name
            )));
        }

        if doc.backup_file_name.trim().is_empty()
            || doc.backup_file_name.contains(['/', '\\'])
            || doc.backup_file_name == doc.file_name
        {
            return Err(TreedocError::Config(format!(
                "documentation.backup_file_name must be a plain file name distinct from '{}'",
                doc.file_name
            )));
        }

        if doc.excerpt_chars == 0 || doc.summary_chars == 0 {
            return Err(TreedocError::Config(
                "documentation excerpt_chars and summary_chars must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai", "ollama", "claude-code"
    pub provider: String,

    /// Model name (provider default when unset)
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Custom API endpoint
    pub api_base: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// Attempts per directory before the analysis is reported as failed
    pub max_attempts: u8,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            api_base: None,
            max_tokens: 4096,
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// =============================================================================
// Classification Configuration
// =============================================================================

/// Additions to the built-in classification sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Extra source extensions (without leading dot)
    pub extra_extensions: Vec<String>,

    /// Extra manifest/config file names
    pub extra_filenames: Vec<String>,

    /// Extra directory names to skip
    pub extra_excluded_dirs: Vec<String>,

    /// Skip directories whose name starts with '.'
    pub skip_hidden_dirs: bool,

    /// Also skip directories ignored by the root .gitignore
    pub respect_gitignore: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            extra_extensions: Vec::new(),
            extra_filenames: Vec::new(),
            extra_excluded_dirs: Vec::new(),
            skip_hidden_dirs: true,
            respect_gitignore: false,
        }
    }
}

// =============================================================================
// Documentation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationConfig {
    /// Documentation file name inside each source folder
    pub file_name: String,

    /// Backup file name inside each source folder
    pub backup_file_name: String,

    /// Characters of each child document passed to the analyzer
    pub summary_chars: usize,

    /// Characters of each child document shown in the reference section
    pub excerpt_chars: usize,

    /// Depth of the folder tree passed to the analyzer
    pub tree_depth: usize,

    /// Maximum characters read from a single source file
    pub max_file_chars: usize,

    /// Files above this size (bytes) are listed without content
    pub max_file_size: u64,
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            file_name: docs::FILE_NAME.to_string(),
            backup_file_name: docs::BACKUP_FILE_NAME.to_string(),
            summary_chars: analysis::SUMMARY_CHARS,
            excerpt_chars: analysis::EXCERPT_CHARS,
            tree_depth: analysis::TREE_DEPTH,
            max_file_chars: analysis::MAX_FILE_CHARS,
            max_file_size: analysis::MAX_FILE_SIZE,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.documentation.file_name, "README.md");
        assert_eq!(config.documentation.backup_file_name, "README.md.backup");
        assert!(config.classification.skip_hidden_dirs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(matches!(config.validate(), Err(TreedocError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_same_backup_name() {
        let mut config = Config::default();
        config.documentation.backup_file_name = "README.md".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nested_file_name() {
        let mut config = Config::default();
        config.documentation.file_name = "docs/README.md".to_string();
        assert!(config.validate().is_err());
    }
}
