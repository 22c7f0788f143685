//! Inference engine abstraction and the Anthropic-backed implementation.
//!
//! The pipeline only needs `invoke(instruction, input) -> text | error`;
//! everything else about the engine (identity, authentication, token
//! accounting) stays behind this trait. The engine enforces a practical
//! upper bound on per-call input size, which is why the chunk budget is
//! configured conservatively below it.

use async_trait::async_trait;
use miette::Diagnostic;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A fallible, rate-constrained remote text-analysis service.
///
/// Implementations take a system instruction and user text and return the
/// engine's response text. The dispatcher treats every call as independent
/// and isolates failures per call.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn invoke(&self, instruction: &str, input: &str) -> Result<String, EngineError>;
}

/// Errors produced by an inference call.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// The API key environment variable is not set.
    #[error("{API_KEY_ENV} environment variable is not set")]
    #[diagnostic(
        code(reqsmith::engine::missing_api_key),
        help("Export {API_KEY_ENV} or add it to a .env file.")
    )]
    MissingApiKey,

    /// Transport-level failure (connection, timeout, TLS).
    #[error("inference request failed: {0}")]
    #[diagnostic(code(reqsmith::engine::transport))]
    Transport(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("inference engine returned status {status}: {body}")]
    #[diagnostic(code(reqsmith::engine::api_status))]
    ApiStatus { status: u16, body: String },

    /// The response decoded but carried no usable text.
    #[error("inference response contained no text content")]
    #[diagnostic(code(reqsmith::engine::empty_response))]
    EmptyResponse,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<MessagePayload<'a>>,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// [`InferenceEngine`] backed by the Anthropic Messages API.
///
/// Uses temperature 0 so repeated analyses of the same chunk are as stable
/// as the engine allows.
#[derive(Clone)]
pub struct AnthropicEngine {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicEngine {
    /// Build an engine from the `ANTHROPIC_API_KEY` environment variable.
    ///
    /// Fails immediately when the key is absent so a misconfigured run
    /// stops before any files are read.
    pub fn from_env() -> Result<Self, EngineError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| EngineError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the API endpoint, primarily for tests against a local mock.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl InferenceEngine for AnthropicEngine {
    async fn invoke(&self, instruction: &str, input: &str) -> Result<String, EngineError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system: instruction,
            messages: vec![MessagePayload {
                role: "user",
                content: input,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: MessagesResponse = response.json().await?;
        let text: String = decoded
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        debug!(model = %self.model, chars = text.len(), "inference call completed");
        Ok(text)
    }
}
