//! Ollama Provider
//!
//! Calls `/api/generate` on a running Ollama server, non-streaming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::{LlmProvider, LlmResponse, ProviderConfig, TokenUsage, http_client, status_error};
use crate::types::{Result, TreedocError};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:latest";

pub struct OllamaProvider {
    api_base: String,
    model: String,
    options: GenerateOptions,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = endpoint(config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE))?;

        Ok(Self {
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
            client: http_client(config.timeout_secs)?,
        })
    }

    fn request<'a>(&'a self, system: &'a str, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            system,
            prompt,
            stream: false,
            options: &self.options,
        }
    }
}

/// Parse the configured base URL. Only http(s) is accepted; a remote host
/// is allowed but logged.
fn endpoint(raw: &str) -> Result<String> {
    let url = url::Url::parse(raw).map_err(|e| {
        TreedocError::Config(format!("Invalid Ollama endpoint URL '{}': {}", raw, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TreedocError::Config(format!(
            "Ollama endpoint must use http or https scheme, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str()
        && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
    {
        warn!(host = %host, "Ollama endpoint is not local");
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, system: &str, prompt: &str) -> Result<LlmResponse> {
        debug!(model = %self.model, "Requesting Ollama generation");
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/api/generate", self.api_base))
            .json(&self.request(system, prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TreedocError::LlmApi(format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.api_base
                    ))
                } else {
                    TreedocError::LlmApi(format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(status_error(response, self.name()).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TreedocError::LlmApi(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(LlmResponse::new(
            body.response,
            TokenUsage::new(
                body.prompt_eval_count.unwrap_or(0),
                body.eval_count.unwrap_or(0),
            ),
            start.elapsed(),
        ))
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(api_base: Option<&str>) -> Result<OllamaProvider> {
        OllamaProvider::new(ProviderConfig {
            provider: "ollama".to_string(),
            api_base: api_base.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(matches!(
            ollama(Some("file:///etc/passwd")),
            Err(TreedocError::Config(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let provider = ollama(None).unwrap();
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        let provider = ollama(Some("http://gpu-box:11434/")).unwrap();
        assert_eq!(provider.api_base, "http://gpu-box:11434");
    }

    #[test]
    fn test_request_shape() {
        let provider = ollama(None).unwrap();
        let json = serde_json::to_value(provider.request("sys", "user")).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["prompt"], "user");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 4096);
        assert!(json.get("format").is_none());
    }

    #[test]
    fn test_parse_response_without_counts() {
        let body: GenerateResponse = serde_json::from_str(r##"{"response":"# Api"}"##).unwrap();
        assert_eq!(body.response, "# Api");
        assert!(body.eval_count.is_none());
    }
}
