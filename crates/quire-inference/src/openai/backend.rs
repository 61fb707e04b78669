//! OpenAI-compatible generation backend (Groq by default).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use quire_core::defaults::{GEN_BASE_URL, GEN_MODEL, GEN_TIMEOUT_SECS};
use quire_core::{AiError, Error, GenerationBackend, ModelFailure, ModelRequest, ModelResult, Result};

use super::error::{to_model_failure, OpenAIErrorCode};
use super::types::*;

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key; required.
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: GEN_BASE_URL.to_string(),
            api_key: None,
            model: GEN_MODEL.to_string(),
            timeout_seconds: GEN_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Read `GROQ_API_KEY`, `GROQ_BASE_URL`, `GROQ_MODEL` and `AI_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| GEN_BASE_URL.to_string()),
            api_key: std::env::var("GROQ_API_KEY").ok(),
            model: std::env::var("GROQ_MODEL").unwrap_or_else(|_| GEN_MODEL.to_string()),
            timeout_seconds: std::env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(GEN_TIMEOUT_SECS),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// OpenAI-compatible generation backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
    api_key: String,
}

impl OpenAIBackend {
    /// Create a backend. Fails with [`AiError::Unconfigured`] when no
    /// non-blank API key is set.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or(Error::Ai(AiError::Unconfigured))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.model,
            timeout_secs = config.timeout_seconds,
            "Initializing OpenAI-compatible backend"
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    fn transport_failure(&self, e: reqwest::Error) -> ModelFailure {
        if e.is_timeout() {
            ModelFailure::Timeout(self.config.timeout())
        } else {
            ModelFailure::Generation(format!("Request failed: {}", e))
        }
    }

    async fn send(&self, req: &ModelRequest) -> ModelResult {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(req.system.as_str()),
                ChatMessage::user(req.user.as_str()),
            ],
            temperature: Some(req.temperature),
            max_tokens: Some(req.max_output_tokens),
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<OpenAIErrorResponse>(&text).ok();
            let (error_type, code, message) = match parsed {
                Some(body) => (body.error.error_type, body.error.code, body.error.message),
                None => (None, None, "Unknown error".to_string()),
            };
            let kind = OpenAIErrorCode::from_response(
                status.as_u16(),
                error_type.as_deref(),
                code.as_deref(),
            );
            warn!(
                subsystem = "inference",
                component = "openai",
                status = status.as_u16(),
                error_kind = ?kind,
                error = %message,
                "Provider returned an error"
            );
            return Err(to_model_failure(
                kind,
                &format!("provider returned {}: {}", status, message),
            ));
        }

        let result: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelFailure::Timeout(self.config.timeout())
            } else {
                ModelFailure::Generation(format!("Failed to parse response: {}", e))
            }
        })?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ModelFailure::Generation("empty completion".to_string()));
        }
        Ok(content)
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn complete(&self, req: &ModelRequest) -> ModelResult {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "complete",
            model = %self.config.model,
            prompt_len = req.system.len() + req.user.len(),
            "Sending completion request"
        );

        let timeout = self.config.timeout();
        let result = match tokio::time::timeout(timeout, self.send(req)).await {
            Ok(result) => result,
            Err(_) => Err(ModelFailure::Timeout(timeout)),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => debug!(
                subsystem = "inference",
                component = "openai",
                op = "complete",
                duration_ms,
                response_len = text.len(),
                "Completion finished"
            ),
            Err(failure) => warn!(
                subsystem = "inference",
                component = "openai",
                op = "complete",
                duration_ms,
                error = %failure,
                "Completion failed"
            ),
        }
        result
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
