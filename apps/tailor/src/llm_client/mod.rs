//! LLM Client: the single point of entry for all chat-completion calls.
//!
//! No other module talks to the OpenAI API directly. The analyzer depends on the
//! [`CompletionProvider`] trait so tests and offline runs can swap the backend.
//!
//! Model: gpt-4o-mini (hardcoded to keep replies comparable across runs)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

pub mod prompts;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// The model used for all LLM calls.
pub const MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.3;
/// Upper bound on a single analysis request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_POLICY: RetryPolicy = RetryPolicy::exponential(2, Duration::from_secs(1));

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Rate limits and server errors are worth another attempt; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Api { status, .. } if *status == 429 || *status >= 500)
    }
}

/// A backend that turns a prompt plus system instruction into reply text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it has any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Wraps the chat completions API with a request timeout and bounded retries.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(api_key: String, endpoint: Option<String>) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    /// Single chat completion with retry on 429 and 5xx responses.
    pub async fn call(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<ChatResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request_body = ChatRequest {
            model: MODEL,
            messages,
            max_tokens,
            temperature: TEMPERATURE,
        };

        RETRY_POLICY
            .run("chat completion", LlmError::is_transient, || {
                self.send_once(&request_body, timeout)
            })
            .await
    }

    async fn send_once(
        &self,
        request_body: &ChatRequest<'_>,
        timeout: Duration,
    ) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(request_body)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| classify(e, timeout))?;
        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(chat)
    }

    /// Sends a trivial prompt and checks the reply mentions success.
    pub async fn test_connection(&self) -> bool {
        info!("Testing LLM API connection...");
        match self
            .call(prompts::CONNECTION_TEST_PROMPT, None, 10, CONNECTION_TEST_TIMEOUT)
            .await
        {
            Ok(response) => {
                let ok = response
                    .text()
                    .map(|t| t.to_lowercase().contains("successful"))
                    .unwrap_or(false);
                if ok {
                    info!("API connection test: SUCCESS");
                } else {
                    warn!("API connection test: FAILED (unexpected response)");
                }
                ok
            }
            Err(e) => {
                warn!("API connection test failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self
            .call(prompt, Some(system), MAX_TOKENS, REQUEST_TIMEOUT)
            .await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::Http(err)
    }
}
