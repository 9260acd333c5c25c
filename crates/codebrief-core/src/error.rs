use std::path::PathBuf;

/// Errors that can occur across codebrief.
///
/// Library crates return this type directly; the binary turns it into a
/// `miette` report at the boundary.
///
/// # Examples
///
/// ```
/// use codebrief_core::BriefError;
///
/// let err = BriefError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BriefError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(codebrief::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(codebrief::config), help("check your .codebrief.toml"))]
    Config(String),

    /// Grammar loading or source parsing failure.
    #[error("parse error: {0}")]
    #[diagnostic(code(codebrief::parse))]
    Parse(String),

    /// Embedding backend request or response failure.
    #[error("embedding error: {0}")]
    #[diagnostic(code(codebrief::embedding))]
    Embedding(String),

    /// Chat model request or response failure.
    #[error("LLM error: {0}")]
    #[diagnostic(code(codebrief::llm))]
    Llm(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(codebrief::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(codebrief::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(codebrief::not_found))]
    FileNotFound(PathBuf),

    /// Two vectors that must share a dimension do not.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    #[diagnostic(code(codebrief::dimension))]
    DimensionMismatch {
        /// Dimension of the reference vector.
        expected: usize,
        /// Dimension of the offending vector.
        found: usize,
    },

    /// Corpus paths and embeddings are not parallel sequences.
    #[error("corpus has {paths} paths but {embeddings} embeddings")]
    #[diagnostic(code(codebrief::corpus_shape))]
    CorpusShape {
        /// Number of file paths.
        paths: usize,
        /// Number of embeddings.
        embeddings: usize,
    },

    /// A corpus position outside `0..len`.
    #[error("index {index} is out of range for a corpus of {len} files")]
    #[diagnostic(code(codebrief::index))]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Corpus length.
        len: usize,
    },
}
