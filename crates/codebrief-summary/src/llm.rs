use std::time::Duration;

use async_trait::async_trait;
use codebrief_core::{BriefError, LlmConfig};
use serde::{Deserialize, Serialize};

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use codebrief_summary::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Summarize this file");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use codebrief_summary::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// Anything that answers a list of chat messages with text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation, sampled at `temperature`, and return the
    /// assistant's reply.
    async fn chat(&self, messages: Vec<ChatMessage>, temperature: f64) -> Result<String, BriefError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes `{base_url}/chat/completions`:
/// OpenAI, LM Studio, Ollama, vLLM, LiteLLM.
///
/// # Examples
///
/// ```
/// use codebrief_core::LlmConfig;
/// use codebrief_summary::llm::{ChatClient, ChatModel};
///
/// let client = ChatClient::new(&LlmConfig::default()).unwrap();
/// assert_eq!(client.model(), "gpt-4o");
/// ```
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a new chat client from configuration.
    ///
    /// Falls back to `OPENAI_API_KEY` if no key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, BriefError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BriefError::Llm(format!("failed to create HTTP client: {e}")))?;
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn build_body(&self, messages: &[ChatMessage], temperature: f64) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
        })
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn chat(&self, messages: Vec<ChatMessage>, temperature: f64) -> Result<String, BriefError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut request = self.client
            .post(&url)
            .json(&self.build_body(&messages, temperature));
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| BriefError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(BriefError::Llm(format!("LLM API error {status}: {body_text}")));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BriefError::Llm(format!("failed to parse response: {e}")))?;

        extract_content(&response_body)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn extract_content(response_body: &serde_json::Value) -> Result<String, BriefError> {
    response_body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| BriefError::Llm(format!("unexpected response structure: {response_body}")))
}
