//! Scripted embedding backend for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use codebrief_core::BriefError;

use crate::embedding::EmbeddingBackend;

/// Returns the vector of the first rule whose needle occurs in the text,
/// or the fallback vector. Records every request.
pub(crate) struct ScriptedBackend {
    rules: Vec<(String, Vec<f32>)>,
    fallback: Vec<f32>,
    fail_on: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(fallback: Vec<f32>) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            fail_on: None,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn rule(mut self, needle: &str, vector: Vec<f32>) -> Self {
        self.rules.push((needle.to_string(), vector));
        self
    }

    pub(crate) fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Sleep before answering, so concurrent callers overlap.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingBackend for ScriptedBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BriefError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(BriefError::Embedding("connection refused".into()));
            }
        }

        let vector = self
            .rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map_or(&self.fallback, |(_, vector)| vector);
        Ok(vector.clone())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
