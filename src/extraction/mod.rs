//! Symbol and import extraction from source files.
//!
//! Each language is handled by a pure extraction strategy registered in
//! `ExtractorRegistry`. Strategies parse with tree-sitter and fall back to
//! the heuristic line scanner when a parser cannot be constructed, so
//! extraction never fails on malformed or half-saved input.

mod go;
mod heuristic;
mod python;
mod rust;
mod typescript;

pub use heuristic::extract_heuristic;

use std::collections::HashMap;

use crate::types::{Symbol, SymbolKind};

/// Languages with a registered extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Go,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Unknown => "unknown",
        }
    }
}

/// Detects the language of a file from its extension.
pub fn detect_language(path: &str) -> Language {
    let ext = match path.rsplit('.').next() {
        Some(e) if !e.eq_ignore_ascii_case(path) => e.to_ascii_lowercase(),
        _ => return Language::Unknown,
    };
    match ext.as_str() {
        "rs" => Language::Rust,
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
        "py" | "pyi" => Language::Python,
        "go" => Language::Go,
        _ => Language::Unknown,
    }
}

/// Result of extracting one source file: declared symbols plus raw
/// import/export specifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    /// Import specifiers as written (quotes stripped, Python/Rust relatives
    /// normalized to `./`-style where the file layout implies one).
    pub imports: Vec<String>,
    /// Exported names, deduplicated in declaration order.
    pub exports: Vec<String>,
}

impl Extraction {
    /// Records a symbol and, if exported, its name in the export list.
    pub(crate) fn push_symbol(&mut self, name: &str, kind: SymbolKind, line: u32, exported: bool) {
        if name.is_empty() {
            return;
        }
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            line,
            exported,
        });
        if exported {
            self.push_export(name);
        }
    }

    pub(crate) fn push_export(&mut self, name: &str) {
        if !name.is_empty() && !self.exports.iter().any(|e| e == name) {
            self.exports.push(name.to_string());
        }
    }

    pub(crate) fn push_import(&mut self, specifier: &str) {
        let spec = specifier.trim();
        if !spec.is_empty() && !self.imports.iter().any(|i| i == spec) {
            self.imports.push(spec.to_string());
        }
    }
}

/// A pure extraction strategy: source text in, symbols and specifiers out.
pub type ExtractFn = fn(&str) -> Extraction;

/// Registry of extraction strategies keyed by language.
///
/// Adding a language means registering one function; there is no extractor
/// type hierarchy to subclass.
pub struct ExtractorRegistry {
    strategies: HashMap<Language, ExtractFn>,
}

impl ExtractorRegistry {
    /// Creates a registry with all built-in language strategies.
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Language::Rust, rust::extract);
        registry.register(Language::TypeScript, typescript::extract_typescript);
        registry.register(Language::Tsx, typescript::extract_tsx);
        registry.register(Language::JavaScript, typescript::extract_javascript);
        registry.register(Language::Python, python::extract);
        registry.register(Language::Go, go::extract);
        registry
    }

    /// Registers (or replaces) the strategy for a language.
    pub fn register(&mut self, language: Language, strategy: ExtractFn) {
        self.strategies.insert(language, strategy);
    }

    /// Extracts symbols and specifiers from source text.
    ///
    /// Unregistered languages go through the heuristic scanner. This call
    /// never fails: worst case is an empty extraction.
    pub fn extract(&self, source: &str, language: Language) -> Extraction {
        match self.strategies.get(&language) {
            Some(strategy) => strategy(source),
            None => extract_heuristic(source),
        }
    }

    /// Convenience: detect the language from `path`, then extract.
    pub fn extract_for_path(&self, path: &str, source: &str) -> Extraction {
        self.extract(source, detect_language(path))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses source with the given grammar, returning `None` when the grammar
/// cannot be loaded or the parser gives up; callers fall back to the
/// heuristic scanner in that case.
pub(crate) fn parse_with(
    language: &tree_sitter::Language,
    source: &str,
) -> Option<tree_sitter::Tree> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(language).ok()?;
    parser.parse(source, None)
}

/// Gets the text of a tree-sitter node from the source bytes.
pub(crate) fn node_text(node: tree_sitter::Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// 1-based line number of a node's start position.
pub(crate) fn node_line(node: tree_sitter::Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Strips matching single or double quotes from a string literal's text.
pub(crate) fn strip_quotes(text: &str) -> &str {
    let t = text.trim();
    t.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| t.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .or_else(|| t.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(t)
}
