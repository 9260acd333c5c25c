//! Syntax-aware semantic retrieval of related code.
//!
//! Source files are split into sections with tree-sitter, sections are
//! embedded through a memoizing provider, and each file's whole-file
//! embedding is used to rank sections from the rest of its project.

pub mod cache;
pub mod chunker;
pub mod corpus;
pub mod embedding;
pub mod lang;
pub mod provider;
pub mod retrieve;
pub mod similarity;

#[cfg(test)]
mod testing;
