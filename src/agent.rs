//! Prompt answering backed by a chat-completion model.
//!
//! [`Agent::ask`] builds a system context for the prompt (the base preamble
//! followed by the bodies of the selected documents), sends it together with
//! the prompt to a [`ChatClient`], and returns the model's reply. The HTTP
//! server exposes this as `POST /ask` and the CLI as `ctxl ask`.
//!
//! The client is injected, so tests and alternative backends plug in a
//! different [`ChatClient`] without touching the server.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::AgentConfig;
use crate::loader::ContextLoader;
use crate::traits::ParamError;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The backend cannot be used at all (for example, no API key).
    #[error("chat model unavailable: {0}")]
    Unavailable(String),
    /// The request never produced an HTTP response.
    #[error("chat request failed: {0}")]
    Http(String),
    /// The backend answered with an error or an unusable body.
    #[error("chat API error: {0}")]
    Api(String),
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one system message and one user message to `model` and return
    /// the assistant's reply.
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String, ChatError>;
}

// ============ OpenAI-compatible HTTP client ============

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for any server speaking the OpenAI `/chat/completions` API.
pub struct OpenAiChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        }
    }

    /// Client for `agent.base_url`, keyed from the `agent.api_key_env`
    /// environment variable.
    pub fn from_config(config: &AgentConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::new(&config.base_url, api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::Unavailable("API key not configured".to_string()))?;

        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatError::Api(format!("status {}: {}", status, body)));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ChatError::Api(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| ChatError::Api("response contained no message".to_string()))
    }
}

// ============ Agent ============

/// Answers prompts with the routed documentation as system context.
pub struct Agent {
    loader: Arc<ContextLoader>,
    client: Arc<dyn ChatClient>,
    default_model: String,
}

impl Agent {
    pub fn new(
        loader: Arc<ContextLoader>,
        client: Arc<dyn ChatClient>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            client,
            default_model: default_model.into(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Ask the model about `prompt`. `model` overrides the configured
    /// default when present and non-blank.
    ///
    /// Fails with [`ParamError`] on a blank prompt and with [`ChatError`]
    /// when the backend does.
    pub async fn ask(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ParamError::Empty("prompt").into());
        }

        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.default_model.as_str());
        let system = self.loader.system_context(prompt);

        debug!(model, system_chars = system.len(), "asking chat model");
        let answer = self.client.complete(model, &system, prompt).await?;
        Ok(answer)
    }
}
