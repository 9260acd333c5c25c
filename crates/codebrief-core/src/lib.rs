//! Core types, configuration, and error handling for codebrief.
//!
//! This crate provides the shared foundation used by the other codebrief crates:
//! - [`BriefError`]: unified error type using `thiserror`
//! - [`BriefConfig`]: configuration loaded from `.codebrief.toml`
//! - Shared types: [`RelevantContext`], [`OutputFormat`]

mod config;
mod error;
pub mod logging;
mod types;

pub use config::{
    BriefConfig, CorpusConfig, EmbeddingConfig, EmissionMode, LlmConfig, ReadFailurePolicy,
    RetrievalConfig,
};
pub use error::BriefError;
pub use types::{OutputFormat, RelevantContext};

/// A convenience `Result` type for codebrief operations.
pub type Result<T> = std::result::Result<T, BriefError>;
