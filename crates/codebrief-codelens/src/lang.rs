//! Language detection and the per-language section allow-lists.

use std::path::Path;

/// Source language detected from a file extension.
///
/// # Examples
///
/// ```
/// use codebrief_codelens::lang::Language;
///
/// assert_eq!(Language::from_extension("py"), Language::Python);
/// assert_eq!(Language::from_extension("pyw"), Language::Python);
/// assert_eq!(Language::from_extension("ts"), Language::TypeScript);
/// assert_eq!(Language::from_extension("tsx"), Language::Tsx);
/// assert_eq!(Language::from_extension("mjs"), Language::JavaScript);
/// assert_eq!(Language::from_extension("html"), Language::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Unknown,
}

const PYTHON_SECTIONS: &[&str] = &[
    "class_definition",
    "function_definition",
    "decorator",
    "import_statement",
    "import_from_statement",
];

const TYPESCRIPT_SECTIONS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
    "interface_declaration",
    "enum_declaration",
    "type_alias_declaration",
    "decorator",
    "import_statement",
];

const JAVASCRIPT_SECTIONS: &[&str] = &[
    "class_declaration",
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
    "import_statement",
];

impl Language {
    /// Detect language from a file extension string (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" | "pyw" => Language::Python,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a path's extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use codebrief_codelens::lang::Language;
    ///
    /// assert_eq!(Language::from_path(Path::new("src/app.spec.ts")), Language::TypeScript);
    /// assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
    /// ```
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Language::Unknown, Language::from_extension)
    }

    /// Get the tree-sitter grammar for this language.
    ///
    /// Returns `None` for `Language::Unknown`.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }

    /// Node kinds whose source text becomes a candidate section.
    pub fn section_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python => PYTHON_SECTIONS,
            Language::TypeScript | Language::Tsx => TYPESCRIPT_SECTIONS,
            Language::JavaScript => JAVASCRIPT_SECTIONS,
            Language::Unknown => &[],
        }
    }

    /// Short lowercase name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_have_grammars_and_kinds() {
        for lang in [
            Language::Python,
            Language::TypeScript,
            Language::Tsx,
            Language::JavaScript,
        ] {
            assert!(lang.tree_sitter_language().is_some(), "{lang:?}");
            assert!(!lang.section_kinds().is_empty(), "{lang:?}");
        }
    }

    #[test]
    fn unknown_has_no_grammar() {
        assert!(Language::Unknown.tree_sitter_language().is_none());
        assert!(Language::Unknown.section_kinds().is_empty());
    }

    #[test]
    fn extension_is_case_sensitive() {
        assert_eq!(Language::from_extension("PY"), Language::Unknown);
    }

    #[test]
    fn python_allow_list_covers_imports_and_decorators() {
        let kinds = Language::Python.section_kinds();
        assert!(kinds.contains(&"decorator"));
        assert!(kinds.contains(&"import_from_statement"));
    }
}
