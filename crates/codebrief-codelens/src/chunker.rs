//! Syntax-aware splitting of source files into candidate sections.
//!
//! Recognised languages are parsed with tree-sitter and every node whose kind
//! is on the language's allow-list contributes its source text. Anything else
//! is passed through as a single whole-file section.

use codebrief_core::{BriefError, EmissionMode};
use tree_sitter::{Node, Parser};

use crate::lang::Language;

/// Sections whose trimmed length is at or below this many characters are noise.
pub const MIN_SECTION_CHARS: usize = 50;

/// Splits source text into syntactically bounded sections.
///
/// # Examples
///
/// ```
/// use codebrief_codelens::chunker::SyntaxChunker;
/// use codebrief_codelens::lang::Language;
///
/// let chunker = SyntaxChunker::default();
/// let source = "def greet(name):\n    return f\"Hello, {name}! Welcome back to the project.\"\n";
/// let sections = chunker.chunk(source, Language::Python).unwrap();
/// assert_eq!(sections.len(), 1);
/// assert!(sections[0].starts_with("def greet"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxChunker {
    mode: EmissionMode,
}

impl SyntaxChunker {
    /// Create a chunker with the given emission mode.
    pub fn new(mode: EmissionMode) -> Self {
        Self { mode }
    }

    /// The emission mode in use.
    pub fn mode(&self) -> EmissionMode {
        self.mode
    }

    /// Split `content` into sections.
    ///
    /// For a recognised language the result holds the trimmed text of every
    /// allow-listed node in pre-order, minus anything of
    /// [`MIN_SECTION_CHARS`] characters or fewer. For
    /// [`Language::Unknown`] the untouched content is the only section.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::Parse`] if the grammar cannot be loaded.
    ///
    /// # Examples
    ///
    /// ```
    /// use codebrief_codelens::chunker::SyntaxChunker;
    /// use codebrief_codelens::lang::Language;
    ///
    /// let html = "<p>short</p>";
    /// let sections = SyntaxChunker::default().chunk(html, Language::Unknown).unwrap();
    /// assert_eq!(sections, vec![html.to_string()]);
    /// ```
    pub fn chunk(&self, content: &str, language: Language) -> Result<Vec<String>, BriefError> {
        let Some(ts_language) = language.tree_sitter_language() else {
            return Ok(vec![content.to_string()]);
        };

        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| BriefError::Parse(format!("failed to set language: {e}")))?;

        let Some(tree) = parser.parse(content, None) else {
            return Ok(Vec::new());
        };

        let matches = collect_matches(tree.root_node(), language.section_kinds());
        let selected = select(&matches, self.mode);

        let sections = selected
            .into_iter()
            .filter_map(|node| content.get(node.byte_range()))
            .map(str::trim)
            .filter(|text| text.chars().count() > MIN_SECTION_CHARS)
            .map(str::to_string)
            .collect();

        Ok(sections)
    }
}

/// Pre-order walk over the whole tree, returning allow-listed nodes.
fn collect_matches<'tree>(root: Node<'tree>, kinds: &[&str]) -> Vec<Node<'tree>> {
    let mut matches = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if kinds.contains(&node.kind()) {
            matches.push(node);
        }
        // Reverse push keeps children in source order when popped.
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    matches
}

fn select<'tree>(matches: &[Node<'tree>], mode: EmissionMode) -> Vec<Node<'tree>> {
    match mode {
        EmissionMode::AllMatching => matches.to_vec(),
        // Matching descendants directly follow their ancestor in pre-order, so
        // a match is a leaf unless the next match lies within its byte range.
        EmissionMode::LeafOnly => matches
            .iter()
            .enumerate()
            .filter(|(i, node)| {
                matches
                    .get(i + 1)
                    .map_or(true, |next| !encloses(node, next))
            })
            .map(|(_, node)| *node)
            .collect(),
    }
}

fn encloses(outer: &Node<'_>, inner: &Node<'_>) -> bool {
    inner.start_byte() >= outer.start_byte() && inner.end_byte() <= outer.end_byte()
}
