use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BriefError;

/// Top-level configuration loaded from `.codebrief.toml`.
///
/// Every section is optional; missing keys fall back to their defaults.
///
/// # Examples
///
/// ```
/// use codebrief_core::BriefConfig;
///
/// let config = BriefConfig::default();
/// assert_eq!(config.retrieval.top_n, 5);
/// assert_eq!(config.retrieval.threshold, 0.625);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefConfig {
    /// Embedding backend settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Chat model settings used for summaries.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Relevance retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Corpus construction settings.
    #[serde(default)]
    pub corpus: CorpusConfig,
}

impl BriefConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Io`] if the file cannot be read,
    /// [`BriefError::Toml`] if it is not valid TOML, or
    /// [`BriefError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use codebrief_core::BriefConfig;
    /// use std::path::Path;
    ///
    /// let config = BriefConfig::from_file(Path::new(".codebrief.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, BriefError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Toml`] if parsing fails, or
    /// [`BriefError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use codebrief_core::BriefConfig;
    ///
    /// let toml = r#"
    /// [retrieval]
    /// top_n = 8
    /// "#;
    /// let config = BriefConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.retrieval.top_n, 8);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, BriefError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Config`] naming the first invalid key.
    pub fn validate(&self) -> Result<(), BriefError> {
        let threshold = self.retrieval.threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(BriefError::Config(format!(
                "retrieval.threshold must be within [-1, 1], got {threshold}"
            )));
        }
        if self.retrieval.top_n == 0 {
            return Err(BriefError::Config("retrieval.top_n must be at least 1".into()));
        }
        if self.retrieval.concurrency == 0 {
            return Err(BriefError::Config(
                "retrieval.concurrency must be at least 1".into(),
            ));
        }
        for (key, value) in [
            ("llm.temperature", self.llm.temperature),
            ("llm.project_temperature", self.llm.project_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(BriefError::Config(format!(
                    "{key} must be within [0, 2], got {value}"
                )));
            }
        }
        if self.embedding.cache_capacity == 0 {
            return Err(BriefError::Config(
                "embedding.cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Embedding backend configuration (any OpenAI-compatible `/embeddings` API).
///
/// # Examples
///
/// ```
/// use codebrief_core::EmbeddingConfig;
///
/// let config = EmbeddingConfig::default();
/// assert_eq!(config.model, "text-embedding-3-small");
/// assert_eq!(config.cache_capacity, 10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// API base URL, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Maximum number of section embeddings kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_cache_capacity() -> usize {
    10_000
}

fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            api_key: None,
            cache_capacity: default_cache_capacity(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Chat model configuration (any OpenAI-compatible `/chat/completions` API).
///
/// # Examples
///
/// ```
/// use codebrief_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o");
/// assert_eq!(config.temperature, 0.5);
/// assert_eq!(config.project_temperature, 0.65);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Sampling temperature for file summaries.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Sampling temperature for project questions and the overview.
    #[serde(default = "default_project_temperature")]
    pub project_temperature: f64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gpt-4o".into()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_project_temperature() -> f64 {
    0.65
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            project_temperature: default_project_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Relevance retrieval configuration.
///
/// # Examples
///
/// ```
/// use codebrief_core::{EmissionMode, RetrievalConfig};
///
/// let config = RetrievalConfig::default();
/// assert_eq!(config.concurrency, 4);
/// assert_eq!(config.emission, EmissionMode::AllMatching);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// A section must score strictly above this to be kept (default: 0.625).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Maximum number of sections returned (default: 5).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Maximum number of files scanned at once (default: 4).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Which matching syntax nodes become sections.
    #[serde(default)]
    pub emission: EmissionMode,
}

fn default_threshold() -> f64 {
    0.625
}

fn default_top_n() -> usize {
    5
}

fn default_concurrency() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            top_n: default_top_n(),
            concurrency: default_concurrency(),
            emission: EmissionMode::default(),
        }
    }
}

/// Which matching syntax nodes the chunker emits.
///
/// # Examples
///
/// ```
/// use codebrief_core::EmissionMode;
///
/// let mode: EmissionMode = serde_json::from_str("\"leaf\"").unwrap();
/// assert_eq!(mode, EmissionMode::LeafOnly);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionMode {
    /// Every matching node, so a class and its methods are all emitted.
    #[default]
    #[serde(rename = "all")]
    AllMatching,
    /// Only matching nodes with no matching descendant.
    #[serde(rename = "leaf")]
    LeafOnly,
}

/// Corpus construction configuration.
///
/// # Examples
///
/// ```
/// use codebrief_core::{CorpusConfig, ReadFailurePolicy};
///
/// let config = CorpusConfig::default();
/// assert_eq!(config.on_unreadable, ReadFailurePolicy::FailFast);
/// assert!(!config.respect_gitignore);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// What to do when an eligible file cannot be read.
    #[serde(default)]
    pub on_unreadable: ReadFailurePolicy,
    /// Skip hidden files and anything excluded by `.gitignore`/`.ignore`.
    /// Off by default: eligibility is decided by extension alone.
    #[serde(default = "default_respect_gitignore")]
    pub respect_gitignore: bool,
}

fn default_respect_gitignore() -> bool {
    false
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            on_unreadable: ReadFailurePolicy::default(),
            respect_gitignore: default_respect_gitignore(),
        }
    }
}

/// How corpus construction reacts to a file it cannot read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadFailurePolicy {
    /// Abort the whole build on the first failure.
    #[default]
    #[serde(rename = "fail")]
    FailFast,
    /// Log the failure and leave the file out of the corpus.
    #[serde(rename = "skip")]
    Skip,
}
