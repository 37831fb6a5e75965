use super::error::SynthesisError;
use crate::config::BackendConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Cap on upstream error bodies carried inside `BackendUnavailable`.
const ERROR_BODY_LIMIT: usize = 200;

/// Text-generation backend invoked with a chat-style request.
///
/// The trait seam exists so the synthesis pipeline and the persona
/// suggester can be exercised against a stub without network access.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Whether a credential is available. Checked before a call is allowed
    /// to start, so a session never reaches synthesis unable to finish it.
    fn is_configured(&self) -> bool {
        true
    }

    /// Send a system + user chat request and return the raw text completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenRouter-compatible chat-completions endpoint.
///
/// Sampling temperature is kept low: the reply must parse as structured
/// data, so determinism beats creativity here.
pub struct HttpGenerationBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl HttpGenerationBackend {
    /// Build from config, resolving the credential from the environment
    /// variable the config names.
    pub fn new(config: &BackendConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();

        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, SynthesisError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| SynthesisError::BackendUnavailable {
            status: None,
            message: "API key not configured".to_string(),
        })?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!(
            "Calling generation backend: {} (model={}, payload={} chars)",
            self.base_url,
            self.model,
            user.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::BackendUnavailable {
                status: None,
                message: if e.is_timeout() {
                    format!("request timed out after {}s", self.timeout.as_secs())
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::BackendUnavailable {
                status: Some(status.as_u16()),
                message: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let completion: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| SynthesisError::BackendUnavailable {
                    status: Some(status.as_u16()),
                    message: format!("unreadable completion envelope: {}", e),
                })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(SynthesisError::EmptyBackendReply);
        }

        Ok(content)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        text.to_string()
    } else {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}
