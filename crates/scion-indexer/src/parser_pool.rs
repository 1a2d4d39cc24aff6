//! Tree-sitter parsers cached per grammar
//!
//! `tree_sitter::Parser` is expensive to set up and not `Sync`, so one index
//! run owns a pool and reuses a single parser per grammar for every file.

use crate::parser::ParseError;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Language, Parser, Tree};

/// Grammars with a tree-sitter parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    Python,
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    /// Pick the grammar for a file path from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "py" | "pyi" => Some(Grammar::Python),
            "rs" => Some(Grammar::Rust),
            "ts" | "mts" | "cts" => Some(Grammar::TypeScript),
            "tsx" => Some(Grammar::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            _ => None,
        }
    }

    /// Get the tree-sitter language for this grammar
    pub fn language(self) -> Language {
        match self {
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
            Grammar::Rust => tree_sitter_rust::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Single-threaded parser cache.
#[derive(Default)]
pub struct ParserPool {
    parsers: HashMap<Grammar, Parser>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of grammars loaded so far.
    pub fn loaded(&self) -> usize {
        self.parsers.len()
    }

    pub fn parse(&mut self, grammar: Grammar, source: &str) -> Result<Tree, ParseError> {
        let parser = match self.parsers.entry(grammar) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar.language())
                    .map_err(|e| ParseError::Grammar(e.to_string()))?;
                tracing::debug!("Loaded {:?} grammar", grammar);
                entry.insert(parser)
            }
        };
        parser.parse(source, None).ok_or(ParseError::NoTree)
    }
}

impl std::fmt::Debug for ParserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserPool")
            .field("grammars", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}
