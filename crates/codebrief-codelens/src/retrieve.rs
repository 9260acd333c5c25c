//! Cross-file relevance retrieval.
//!
//! For a query file in a [`CorpusIndex`], every other file is re-chunked and
//! its sections are scored against the query's whole-file embedding. Each
//! file contributes at most `2 * top_n` sections above the threshold; the
//! pooled candidates are then sorted and cut to `top_n`.

use std::cmp::Ordering;
use std::path::Path;

use codebrief_core::{BriefError, RelevantContext, RetrievalConfig};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, error};

use crate::chunker::SyntaxChunker;
use crate::corpus::CorpusIndex;
use crate::lang::Language;
use crate::provider::EmbeddingProvider;
use crate::similarity::{score_all, top_k_indices};

/// Finds the sections elsewhere in a corpus most similar to a given file.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use codebrief_core::RetrievalConfig;
/// use codebrief_codelens::cache::EmbeddingCache;
/// use codebrief_codelens::embedding::OpenAiEmbeddings;
/// use codebrief_codelens::provider::EmbeddingProvider;
/// use codebrief_codelens::retrieve::RelevanceRetriever;
///
/// let backend = OpenAiEmbeddings::new(None, "http://localhost:1234/v1", "bge").unwrap();
/// let provider = EmbeddingProvider::new(
///     Arc::new(backend),
///     Arc::new(EmbeddingCache::with_capacity(1024).unwrap()),
/// );
/// let retriever = RelevanceRetriever::new(provider, RetrievalConfig::default());
/// assert_eq!(retriever.config().top_n, 5);
/// ```
#[derive(Debug, Clone)]
pub struct RelevanceRetriever {
    provider: EmbeddingProvider,
    chunker: SyntaxChunker,
    config: RetrievalConfig,
}

impl RelevanceRetriever {
    /// Create a retriever; the chunker follows `config.emission`.
    pub fn new(provider: EmbeddingProvider, config: RetrievalConfig) -> Self {
        Self {
            provider,
            chunker: SyntaxChunker::new(config.emission),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The embedding provider, shared with whoever built the corpus.
    pub fn provider(&self) -> &EmbeddingProvider {
        &self.provider
    }

    /// Relevant context for the file at `query_index`, using the configured
    /// threshold and result count.
    ///
    /// # Errors
    ///
    /// Only embedding backend failures are returned; see
    /// [`relevant_context_with`](Self::relevant_context_with).
    pub async fn relevant_context(
        &self,
        corpus: &CorpusIndex,
        query_index: usize,
    ) -> Result<Vec<RelevantContext>, BriefError> {
        self.relevant_context_with(corpus, query_index, self.config.threshold, self.config.top_n)
            .await
    }

    /// Relevant context for the file at `query_index`.
    ///
    /// The result never includes the query file, holds at most `top_n`
    /// entries, each scoring strictly above `threshold`, best first.
    ///
    /// An out-of-range `query_index`, an unreadable file, or a file whose
    /// section vectors do not match the query's dimension is logged and
    /// yields fewer results rather than an error.
    ///
    /// # Errors
    ///
    /// Returns the first embedding backend failure.
    pub async fn relevant_context_with(
        &self,
        corpus: &CorpusIndex,
        query_index: usize,
        threshold: f64,
        top_n: usize,
    ) -> Result<Vec<RelevantContext>, BriefError> {
        let Some(query) = corpus.embedding(query_index) else {
            error!(
                "{}",
                BriefError::IndexOutOfRange {
                    index: query_index,
                    len: corpus.len(),
                }
            );
            return Ok(Vec::new());
        };

        let per_file: Vec<Vec<RelevantContext>> = stream::iter(
            corpus
                .paths()
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != query_index),
        )
        .map(|(_, path)| self.scan_file(path, query, threshold, top_n))
        .buffered(self.config.concurrency.max(1))
        .try_collect()
        .await?;

        let mut contexts: Vec<RelevantContext> = per_file.into_iter().flatten().collect();
        contexts.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        contexts.truncate(top_n);

        debug!(query = query_index, results = contexts.len(), "retrieval finished");
        Ok(contexts)
    }

    /// Candidates from one file. Read, parse, and shape failures skip the file.
    async fn scan_file(
        &self,
        path: &Path,
        query: &[f32],
        threshold: f64,
        top_n: usize,
    ) -> Result<Vec<RelevantContext>, BriefError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read file, skipping");
                return Ok(Vec::new());
            }
        };

        let language = Language::from_path(path);
        let sections = match self.chunker.chunk(&content, language) {
            Ok(sections) => sections,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to chunk file, skipping");
                return Ok(Vec::new());
            }
        };
        if sections.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(sections.len());
        for section in &sections {
            vectors.push(self.provider.embed_cached(section).await?);
        }

        let scores = match score_all(query, &vectors) {
            Ok(scores) => scores,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to score sections, skipping");
                return Ok(Vec::new());
            }
        };

        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let candidates: Vec<RelevantContext> = top_k_indices(&scores, top_n.saturating_mul(2))
            .into_iter()
            .filter(|&i| scores[i] > threshold)
            .map(|i| RelevantContext {
                file: file.clone(),
                section: sections[i].clone(),
                similarity: scores[i],
            })
            .collect();

        debug!(
            path = %path.display(),
            language = language.as_str(),
            sections = sections.len(),
            kept = candidates.len(),
            "scanned file"
        );
        Ok(candidates)
    }
}
