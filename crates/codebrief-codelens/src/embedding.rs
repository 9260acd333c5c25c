//! Embedding backend contract and an OpenAI-compatible HTTP client.
//!
//! Works with any server exposing `POST {base_url}/embeddings`: OpenAI,
//! LM Studio, Ollama, vLLM, LiteLLM.

use std::time::Duration;

use async_trait::async_trait;
use codebrief_core::{BriefError, EmbeddingConfig};
use serde::{Deserialize, Serialize};

/// Anything that turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed one text exactly as given.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BriefError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// Client for an OpenAI-compatible embeddings endpoint.
///
/// # Examples
///
/// ```
/// use codebrief_codelens::embedding::{EmbeddingBackend, OpenAiEmbeddings};
///
/// let client = OpenAiEmbeddings::new(None, "http://localhost:1234/v1", "bge-large-en-v1.5").unwrap();
/// assert_eq!(client.model(), "bge-large-en-v1.5");
/// ```
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDataItem>,
}

#[derive(Deserialize)]
struct EmbedDataItem {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    /// Create a client for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Embedding`] if the HTTP client cannot be built.
    pub fn new(api_key: Option<&str>, base_url: &str, model: &str) -> Result<Self, BriefError> {
        Self::build(
            api_key.map(str::to_string),
            base_url,
            model,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client from an [`EmbeddingConfig`].
    ///
    /// Falls back to the `OPENAI_API_KEY` env var if no key is configured. A
    /// missing key is not an error: local servers usually accept anonymous
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Embedding`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use codebrief_core::EmbeddingConfig;
    /// use codebrief_codelens::embedding::OpenAiEmbeddings;
    ///
    /// let client = OpenAiEmbeddings::with_config(&EmbeddingConfig::default()).unwrap();
    /// ```
    pub fn with_config(config: &EmbeddingConfig) -> Result<Self, BriefError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Self::build(
            api_key,
            &config.base_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn build(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, BriefError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BriefError::Embedding(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn build_request<'a>(&'a self, text: &'a str) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model,
            input: vec![text],
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BriefError> {
        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&self.build_request(text));
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| BriefError::Embedding(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".into());
            return Err(BriefError::Embedding(format!(
                "embeddings API returned {status}: {body}"
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| BriefError::Embedding(format!("failed to parse response: {e}")))?;

        parse_first(embed_response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_first(response: EmbedResponse) -> Result<Vec<f32>, BriefError> {
    response
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .ok_or_else(|| BriefError::Embedding("empty response from embeddings API".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_format_is_correct() {
        let client = OpenAiEmbeddings::new(Some("key"), "http://localhost:1234/v1", "bge").unwrap();
        let json = serde_json::to_value(client.build_request("def main(): pass")).unwrap();
        assert_eq!(json["model"], "bge");
        assert_eq!(json["input"][0], "def main(): pass");
        assert_eq!(json["input"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn response_parsing_takes_first_item() {
        let json = r#"{
            "object": "list",
            "data": [
                {"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}
            ],
            "model": "bge"
        }"#;
        let response: EmbedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_first(response).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn empty_response_is_an_error() {
        let response: EmbedResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        let err = parse_first(response).unwrap_err();
        assert!(matches!(err, BriefError::Embedding(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = OpenAiEmbeddings::new(None, "http://localhost:1234/v1/", "bge").unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = OpenAiEmbeddings::new(Some("sk-secret"), "http://x/v1", "bge").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("bge"));
    }
}
