//! LLM-backed summarisation for codebrief.
//!
//! - [`llm`]: OpenAI-compatible chat client behind the [`llm::ChatModel`] trait
//! - [`prompt`]: prompt builders for file and project summaries
//! - [`pipeline`]: the [`pipeline::Summarizer`] tying retrieval to the chat model

pub mod llm;
pub mod pipeline;
pub mod prompt;
