//! Chat-completion client for the OpenAI REST API.
//!
//! Calls the Chat Completions endpoint directly.
//! Configuration priority: ~/.config/rozmova/secret.json > environment variables

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rozmova_core::service::CompletionService;
use rozmova_core::session::ChatMessage;
use rozmova_core::{Result, RozmovaError};
use rozmova_infrastructure::SecretStorage;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 3000;
const TEMPERATURE: f32 = 0.9;

/// Client for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    /// Creates a client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Loads configuration from the secret file or environment variables.
    ///
    /// Priority:
    /// 1. ~/.config/rozmova/secret.json
    /// 2. Environment variables (OPENAI_API_KEY, OPENAI_MODEL_NAME)
    ///
    /// Model name defaults to `gpt-4o-mini` if not specified.
    pub fn try_from_env() -> Result<Self> {
        if let Ok(storage) = SecretStorage::new() {
            if let Ok(secret_config) = storage.load() {
                if let Some(openai) = secret_config.openai {
                    let model = openai.model_name.unwrap_or_else(|| DEFAULT_MODEL.into());
                    return Ok(Self::new(openai.api_key, model));
                }
            }
        }

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            RozmovaError::config(
                "OPENAI_API_KEY not found in ~/.config/rozmova/secret.json or environment",
            )
        })?;
        let model = env::var("OPENAI_MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The resolved API key, shared with the voice client at wiring time.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| RozmovaError::completion(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| RozmovaError::completion(format!("failed to parse response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl CompletionService for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        tracing::debug!(model = %self.model, messages = messages.len(), "completion request");
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| RozmovaError::completion("no content in the response"))
}

fn map_http_error(status: StatusCode, body: String) -> RozmovaError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    RozmovaError::completion(format!("HTTP {status}: {message}"))
}
