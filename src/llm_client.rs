//! Capability interface to the external text-generation collaborator.
//!
//! The engine treats the model backend as an untrusted, possibly slow,
//! possibly failing black box behind [`TextGenerator`]. The orchestrator owns
//! the per-call deadline; implementations only have to produce text or fail
//! with an opaque error.
//!
//! [`OpenAiClient`] is the bundled implementation, speaking the
//! chat-completions protocol of OpenAI-compatible servers.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling parameters sent along with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Model identifier understood by the backend.
    pub model: String,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f32,
    /// Optional system prompt prefixed to the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Optional completion length cap; move answers only need a few tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A text-generation backend.
///
/// Implementations must be shareable across concurrent matches. Errors are
/// deliberately opaque (`anyhow::Error`): the engine maps any failure of this
/// boundary to its `Unavailable` decision path without inspecting the cause.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for `prompt` under `sampling`.
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> anyhow::Result<String>;
}

/// Connection parameters for an OpenAI-compatible server.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL of the API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub api_key: String,
}

impl OpenAiConfig {
    /// Config for a specific server.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Config from `OPENAI_API_KEY` and (optionally) `OPENAI_BASE_URL`.
    ///
    /// # Errors
    /// Fails when `OPENAI_API_KEY` is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        Ok(Self { base_url, api_key })
    }
}

/// Chat-completions client for OpenAI-compatible servers.
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Creates a client for the given server.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: OpenAiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dilemma-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("could not build HTTP client")?;
        Ok(Self { config, http })
    }

    /// Creates a client from environment variables (see [`OpenAiConfig::from_env`]).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> anyhow::Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &sampling.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model: &sampling.model,
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        debug!(model = %sampling.model, temperature = sampling.temperature, "requesting completion");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("request to text generation backend failed")?
            .error_for_status()
            .context("text generation backend returned an error status")?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("could not decode text generation response")?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
