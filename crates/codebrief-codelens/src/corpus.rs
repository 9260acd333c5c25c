//! Whole-file embedding index over the eligible files of a folder.

use std::path::{Path, PathBuf};

use codebrief_core::{BriefError, CorpusConfig, ReadFailurePolicy};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::provider::EmbeddingProvider;

/// Parallel sequences of file paths and whole-file embeddings.
///
/// A file's position is its identity for retrieval.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use codebrief_codelens::corpus::CorpusIndex;
///
/// let corpus = CorpusIndex::from_parts(
///     vec![PathBuf::from("a.py"), PathBuf::from("b.py")],
///     vec![vec![1.0, 0.0], vec![0.0, 1.0]],
/// )
/// .unwrap();
/// assert_eq!(corpus.len(), 2);
/// assert_eq!(corpus.embedding(1), Some(&[0.0, 1.0][..]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    paths: Vec<PathBuf>,
    embeddings: Vec<Vec<f32>>,
}

impl CorpusIndex {
    /// Assemble an index from already computed parts.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::CorpusShape`] if the sequences differ in length.
    pub fn from_parts(paths: Vec<PathBuf>, embeddings: Vec<Vec<f32>>) -> Result<Self, BriefError> {
        if paths.len() != embeddings.len() {
            return Err(BriefError::CorpusShape {
                paths: paths.len(),
                embeddings: embeddings.len(),
            });
        }
        Ok(Self { paths, embeddings })
    }

    /// File paths in corpus order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Whole-file embeddings in corpus order.
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Embedding of the file at `index`.
    pub fn embedding(&self, index: usize) -> Option<&[f32]> {
        self.embeddings.get(index).map(Vec::as_slice)
    }

    /// Position of `path`, compared exactly.
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.paths.iter().position(|p| p == path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the corpus has no files.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Split back into the two sequences.
    pub fn into_parts(self) -> (Vec<PathBuf>, Vec<Vec<f32>>) {
        (self.paths, self.embeddings)
    }
}

/// Whether a file takes part in the corpus: `.html`, `.py`, and `.ts` files
/// except `.spec.ts` tests.
///
/// # Examples
///
/// ```
/// use codebrief_codelens::corpus::is_eligible;
///
/// assert!(is_eligible("views.py"));
/// assert!(is_eligible("index.html"));
/// assert!(is_eligible("app.component.ts"));
/// assert!(!is_eligible("app.component.spec.ts"));
/// assert!(!is_eligible("README.md"));
/// ```
pub fn is_eligible(file_name: &str) -> bool {
    file_name.ends_with(".html")
        || file_name.ends_with(".py")
        || (file_name.ends_with(".ts") && !file_name.ends_with(".spec.ts"))
}

/// Walk `root` recursively and return eligible files in sorted walk order.
///
/// Without `respect_gitignore` every eligible file is returned, hidden or
/// ignored ones included. With it, hidden files and anything excluded by
/// ignore files are skipped. Unreadable directory entries are skipped.
///
/// # Errors
///
/// Returns [`BriefError::FileNotFound`] if `root` is not a directory.
pub fn discover_files(root: &Path, respect_gitignore: bool) -> Result<Vec<PathBuf>, BriefError> {
    if !root.is_dir() {
        return Err(BriefError::FileNotFound(root.to_path_buf()));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(respect_gitignore)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let eligible = entry
            .file_name()
            .to_str()
            .is_some_and(is_eligible);
        if eligible {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Builds a [`CorpusIndex`] by embedding each eligible file in full.
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    provider: EmbeddingProvider,
    config: CorpusConfig,
}

impl CorpusBuilder {
    /// Create a builder.
    pub fn new(provider: EmbeddingProvider, config: CorpusConfig) -> Self {
        Self { provider, config }
    }

    /// Embed every eligible file under `folder`.
    ///
    /// Whole-file embeddings go straight to the backend and never populate
    /// the section cache.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::FileNotFound`] if `folder` is not a directory,
    /// [`BriefError::Io`] for an unreadable file under
    /// [`ReadFailurePolicy::FailFast`], and any embedding backend failure.
    pub async fn build(&self, folder: &Path) -> Result<CorpusIndex, BriefError> {
        let candidates = discover_files(folder, self.config.respect_gitignore)?;
        let mut paths = Vec::with_capacity(candidates.len());
        let mut embeddings = Vec::with_capacity(candidates.len());

        for path in candidates {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => match self.config.on_unreadable {
                    ReadFailurePolicy::FailFast => {
                        return Err(BriefError::Io(std::io::Error::new(
                            e.kind(),
                            format!("{}: {e}", path.display()),
                        )));
                    }
                    ReadFailurePolicy::Skip => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable file");
                        continue;
                    }
                },
            };

            let embedding = self.provider.embed(&content).await?;
            debug!(path = %path.display(), dims = embedding.len(), "embedded file");
            paths.push(path);
            embeddings.push(embedding);
        }

        info!(root = %folder.display(), files = paths.len(), "corpus built");
        CorpusIndex::from_parts(paths, embeddings)
    }
}
