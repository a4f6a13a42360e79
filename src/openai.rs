use crate::config::LlmConfig;
use crate::error::TransportError;
use crate::interpreter::ChatModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

pub struct OpenAiClient {
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            client,
        }
    }

    fn send(&self, system_prompt: &str, user_text: &str) -> Result<String, TransportError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.network_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }

        let parsed: ChatResponse = resp.json().map_err(|e| self.network_error(e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| TransportError::UnexpectedReply("no choices returned".to_string()))
    }

    fn network_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else if err.is_decode() {
            TransportError::UnexpectedReply(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }

    /// Whether the endpoint answers at all; used by `doctor`.
    pub fn is_available(&self) -> bool {
        self.client.head(&self.endpoint).send().is_ok()
    }
}

impl ChatModel for OpenAiClient {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, TransportError> {
        debug!(model = %self.model, chars = user_text.len(), "requesting completion");
        self.send(system_prompt, user_text)
    }
}

/// Maps a non-success HTTP status onto the user-facing transport error.
pub fn classify_status(status: u16, reason: &str) -> TransportError {
    match status {
        401 => TransportError::InvalidCredential,
        429 => TransportError::RateLimited,
        _ => TransportError::Http {
            status,
            reason: reason.to_string(),
        },
    }
}
