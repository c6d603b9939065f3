//! Claude Code CLI Provider
//!
//! Runs `claude -p` once per call and reads the JSON envelope it prints.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::{LlmProvider, LlmResponse, ProviderConfig, TokenUsage};
use crate::types::{Result, TreedocError};

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub struct ClaudeCodeProvider {
    model: String,
    timeout: Duration,
    temperature: f32,
}

impl ClaudeCodeProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(config.timeout_secs),
            temperature: config.temperature,
        }
    }

    fn command(&self, system: &str, prompt: &str) -> Command {
        let mut cmd = Command::new("claude");
        cmd.arg("-p")
            .arg(prompt)
            .arg("--append-system-prompt")
            .arg(system)
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.model)
            .env("CLAUDE_CODE_TEMPERATURE", self.temperature.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, system: &str, prompt: &str) -> Result<Output> {
        let child = self.command(system, prompt).spawn().map_err(|e| {
            TreedocError::LlmApi(format!(
                "Failed to spawn Claude Code CLI: {}. Is it installed?",
                e
            ))
        })?;

        timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                TreedocError::LlmApi(format!(
                    "Claude Code timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| TreedocError::LlmApi(format!("Claude Code execution failed: {}", e)))
    }
}

/// The `--output-format json` envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    usage: Option<EnvelopeUsage>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl Envelope {
    fn usage(&self) -> TokenUsage {
        self.usage
            .as_ref()
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default()
    }
}

/// Turn CLI output into generated text, surfacing API errors reported in
/// the envelope before falling back to stderr.
fn parse_output(output: &Output) -> Result<Envelope> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let envelope = serde_json::from_str::<Envelope>(&stdout);

    if let Ok(envelope) = &envelope
        && envelope.is_error
    {
        return Err(TreedocError::LlmApi(format!(
            "Claude Code API error: {}",
            envelope.result.as_deref().unwrap_or("Unknown API error")
        )));
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => "Process exited with non-zero status",
            trimmed => trimmed,
        };
        return Err(TreedocError::LlmApi(format!("Claude Code failed: {}", message)));
    }

    envelope.map_err(|e| TreedocError::LlmApi(format!("Failed to parse Claude Code output: {}", e)))
}

#[async_trait]
impl LlmProvider for ClaudeCodeProvider {
    async fn generate(&self, system: &str, prompt: &str) -> Result<LlmResponse> {
        debug!(model = %self.model, "Running Claude Code CLI");
        let start = Instant::now();

        let output = self.run(system, prompt).await?;
        let envelope = parse_output(&output)?;
        let usage = envelope.usage();
        let content = envelope.result.ok_or_else(|| {
            TreedocError::LlmApi("No result text in Claude Code response".to_string())
        })?;

        Ok(LlmResponse::new(content, usage, start.elapsed()))
    }

    fn name(&self) -> &str {
        "claude-code"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_envelope_usage() {
        let envelope: Envelope = serde_json::from_str(
            r##"{"result":"# Module","usage":{"input_tokens":1000,"output_tokens":500}}"##,
        )
        .unwrap();
        assert_eq!(envelope.usage().total(), 1500);

        let bare: Envelope = serde_json::from_str(r##"{"result":"x"}"##).unwrap();
        assert_eq!(bare.usage().total(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_reported_api_error_wins() {
        let out = output(1, r##"{"is_error":true,"result":"overloaded"}"##, "boom");
        let err = parse_output(&out).unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_falls_back_to_stderr() {
        let out = output(2, "", "not logged in\n");
        let err = parse_output(&out).unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_envelope() {
        let out = output(0, r##"{"result":"# Api\n\nHandlers."}"##, "");
        let envelope = parse_output(&out).unwrap();
        assert_eq!(envelope.result.as_deref(), Some("# Api\n\nHandlers."));
    }

    #[test]
    fn test_model_override() {
        let provider = ClaudeCodeProvider::new(ProviderConfig {
            provider: "claude-code".to_string(),
            model: Some("haiku".to_string()),
            ..Default::default()
        });
        assert_eq!(provider.model(), "haiku");
        assert_eq!(provider.name(), "claude-code");
    }
}
