//! Anthropic Messages API client
//!
//! Sends the rendered prompt for one word and returns the parsed card
//! content. Transient failures (rate limiting, overload, 5xx, network) are
//! retried with exponential backoff; everything else fails on first attempt.

use crate::models::FlashcardContent;
use crate::services::response_parser::parse_response;
use crate::services::ContentGenerator;
use crate::utils::{retry_transient, RetryPolicy, Transient};
use ankiforge_common::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const USER_AGENT: &str = concat!("ankiforge/", env!("CARGO_PKG_VERSION"));
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8000;

/// Placeholder substituted with the word when present in the template
pub const WORD_PLACEHOLDER: &str = "{word}";

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            LlmError::NetworkError(_) | LlmError::RateLimited(_) => true,
            // 529 is "overloaded"
            LlmError::ApiError(status, _) => *status >= 500,
            _ => false,
        }
    }
}

/// Prompt text loaded from the template file
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read the template from disk
    pub fn load(path: &Path) -> Result<Self, LlmError> {
        std::fs::read_to_string(path)
            .map(Self::new)
            .map_err(|e| {
                LlmError::Template(format!(
                    "Prompt template not found at {}: {}",
                    path.display(),
                    e
                ))
            })
    }

    /// Full prompt for one word
    ///
    /// Templates containing `{word}` get it substituted; otherwise the word
    /// is appended after a separator.
    pub fn render(&self, word: &str) -> String {
        if self.text.contains(WORD_PLACEHOLDER) {
            self.text.replace(WORD_PLACEHOLDER, word)
        } else {
            format!("{}\n\n---\n\nPalavra: {}", self.text, word)
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Claude (Anthropic Messages API) client
pub struct ClaudeClient {
    http_client: reqwest::Client,
    messages_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    retry_policy: RetryPolicy,
    template: PromptTemplate,
}

impl ClaudeClient {
    pub fn new(
        api_key: String,
        config: &LlmConfig,
        template: PromptTemplate,
    ) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            messages_url: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            retry_policy: RetryPolicy::exponential(
                config.max_retries.saturating_add(1),
                Duration::from_millis(INITIAL_BACKOFF_MS),
                Duration::from_millis(MAX_BACKOFF_MS),
            ),
            template,
        })
    }

    /// Override the retry policy (tests use zero delays)
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Send a prompt and return the response text, retrying transient failures
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        retry_transient("llm completion", self.retry_policy, |_| self.send_once(prompt))
            .await
            .map_err(|failure| failure.error)
    }

    async fn send_once(&self, prompt: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Querying Messages API");

        let response = self
            .http_client
            .post(&self.messages_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(LlmError::InvalidApiKey);
        }

        if status == 429 {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::RateLimited(error_text));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(status.as_u16(), error_text));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl ContentGenerator for ClaudeClient {
    async fn generate_content(&self, word: &str) -> Result<FlashcardContent, LlmError> {
        let prompt = self.template.render(word);
        let text = self.complete(&prompt).await?;

        let content = parse_response(&text, word);
        tracing::info!(
            word = %word,
            content_chars = content.content.chars().count(),
            visual_concept_chars = content.visual_concept.chars().count(),
            "Content generated"
        );

        Ok(content)
    }
}
