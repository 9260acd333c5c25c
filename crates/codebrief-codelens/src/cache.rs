//! Bounded, thread-safe memo of section embeddings keyed by exact text.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use codebrief_core::BriefError;
use lru::LruCache;
use serde::Serialize;

/// Hit/miss counters and occupancy of an [`EmbeddingCache`].
///
/// # Examples
///
/// ```
/// use codebrief_codelens::cache::CacheStats;
///
/// let stats = CacheStats { hits: 3, misses: 1, len: 1, capacity: 8 };
/// assert_eq!(stats.hit_rate(), 0.75);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries currently held.
    pub len: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

struct Inner {
    entries: LruCache<String, Arc<[f32]>>,
    hits: u64,
    misses: u64,
}

/// Least-recently-used cache from text to embedding vector.
///
/// Keys compare by literal string equality; no normalisation happens here.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use codebrief_codelens::cache::EmbeddingCache;
///
/// let cache = EmbeddingCache::with_capacity(2).unwrap();
/// cache.insert("a".into(), Arc::from(vec![1.0_f32]));
/// assert_eq!(cache.get("a").as_deref(), Some(&[1.0_f32][..]));
/// assert!(cache.get("b").is_none());
/// ```
pub struct EmbeddingCache {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` vectors.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Create a cache from a plain capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Config`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, BriefError> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| BriefError::Config("embedding cache capacity must be at least 1".into()))?;
        Ok(Self::new(capacity))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the LRU half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up `text`, marking it most recently used on a hit.
    pub fn get(&self, text: &str) -> Option<Arc<[f32]>> {
        let mut inner = self.lock();
        let found = inner.entries.get(text).cloned();
        match found {
            Some(vector) => {
                inner.hits += 1;
                Some(vector)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store a vector, evicting the least recently used entry when full.
    pub fn insert(&self, text: String, vector: Arc<[f32]>) {
        self.lock().entries.put(text, vector);
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Current counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            len: inner.entries.len(),
            capacity: inner.entries.cap().get(),
        }
    }
}
