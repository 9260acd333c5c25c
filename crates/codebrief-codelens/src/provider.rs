//! Embedding entry point used by corpus building and retrieval.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use codebrief_core::BriefError;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::cache::{CacheStats, EmbeddingCache};
use crate::embedding::EmbeddingBackend;

/// A backend plus a shared memo of section embeddings.
///
/// Cloning is cheap and clones share the cache. Concurrent misses on the
/// same text share one backend request.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use codebrief_codelens::cache::EmbeddingCache;
/// use codebrief_codelens::embedding::OpenAiEmbeddings;
/// use codebrief_codelens::provider::EmbeddingProvider;
///
/// let backend = OpenAiEmbeddings::new(None, "http://localhost:1234/v1", "bge").unwrap();
/// let cache = EmbeddingCache::with_capacity(1024).unwrap();
/// let provider = EmbeddingProvider::new(Arc::new(backend), Arc::new(cache));
/// assert_eq!(provider.cache_stats().capacity, 1024);
/// ```
#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Arc<EmbeddingCache>,
    in_flight: Arc<Mutex<HashMap<String, Arc<OnceCell<Arc<[f32]>>>>>>,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("model", &self.backend.model())
            .field("cache", &self.cache)
            .finish()
    }
}

impl EmbeddingProvider {
    /// Wire a backend to a cache.
    pub fn new(backend: Arc<dyn EmbeddingBackend>, cache: Arc<EmbeddingCache>) -> Self {
        Self {
            backend,
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, Arc<OnceCell<Arc<[f32]>>>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Embed `text` through the backend, bypassing the cache.
    ///
    /// Newlines are replaced with spaces before the request.
    ///
    /// # Errors
    ///
    /// Propagates any backend failure.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, BriefError> {
        let normalized = text.replace('\n', " ");
        self.backend.embed(&normalized).await
    }

    /// Embed `text`, reusing an earlier result for the identical string.
    ///
    /// The first caller for a text computes it; callers arriving while that
    /// request is pending wait for its result instead of issuing their own.
    ///
    /// # Errors
    ///
    /// Propagates any backend failure; failures are not cached.
    pub async fn embed_cached(&self, text: &str) -> Result<Arc<[f32]>, BriefError> {
        if let Some(vector) = self.cache.get(text) {
            debug!(chars = text.len(), "embedding cache hit");
            return Ok(vector);
        }

        let cell = Arc::clone(
            self.pending()
                .entry(text.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        );

        let result = cell
            .get_or_try_init(|| async {
                debug!(chars = text.len(), model = self.backend.model(), "embedding cache miss");
                self.embed(text).await.map(Arc::<[f32]>::from)
            })
            .await
            .cloned();

        if let Ok(vector) = &result {
            self.cache.insert(text.to_string(), Arc::clone(vector));
        }
        // Publish to the cache before retiring the pending entry so a late
        // caller finds one or the other.
        let mut pending = self.pending();
        if pending.get(text).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
            pending.remove(text);
        }

        result
    }

    /// Counters of the shared cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
