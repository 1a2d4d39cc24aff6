//! Parser contract shared by every language
//!
//! A parser turns the text of one file into a [`ParsedFile`]: a summary line,
//! raw imports, and declarations. Parsers hold no state between files; the
//! tree-sitter parsers they need are borrowed from a [`ParserPool`].

use crate::parser_pool::ParserPool;
use scion_core::{EdgeKind, Interface, InterfaceKind, Language};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a module summary line.
pub const SUMMARY_MAX_CHARS: usize = 120;

/// How much structure a parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fidelity {
    /// Full syntax tree from a tree-sitter grammar.
    Syntax,
    /// Line patterns; best effort, misses anything unusual.
    Pattern,
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fidelity::Syntax => "syntax",
            Fidelity::Pattern => "pattern",
        })
    }
}

/// One import statement as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Raw specifier: `os.path`, `crate::graph`, `./util`, `<stdio.h>`.
    pub module: String,
    pub alias: Option<String>,
    /// Names brought in: `from x import a, b`, `use x::{a, b}`.
    pub names: Vec<String>,
    /// Leading dots of a Python relative import.
    pub level: u32,
    pub kind: EdgeKind,
    pub line: u32,
}

impl Import {
    pub fn new(module: impl Into<String>, kind: EdgeKind, line: u32) -> Self {
        Import {
            module: module.into(),
            alias: None,
            names: Vec::new(),
            level: 0,
            kind,
            line,
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// Fields every declaration carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub signature: String,
    pub doc: String,
    pub line: u32,
}

impl Header {
    pub fn new(name: impl Into<String>, signature: impl Into<String>, line: u32) -> Self {
        Header {
            name: name.into(),
            signature: signature.into(),
            doc: String::new(),
            line,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A top-level construct found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Class { header: Header, bases: Vec<String>, methods: Vec<String> },
    Function { header: Header, is_async: bool },
    Struct { header: Header, fields: Vec<String> },
    Enum { header: Header, variants: Vec<String> },
    Trait { header: Header, methods: Vec<String> },
    Interface { header: Header, methods: Vec<String> },
    /// `impl Type` or `impl Trait for Type`; the header name is the type.
    Impl { header: Header, trait_name: Option<String>, methods: Vec<String> },
    Macro { header: Header },
    Const { header: Header },
    TypeAlias { header: Header },
}

impl Declaration {
    pub fn header(&self) -> &Header {
        match self {
            Declaration::Class { header, .. }
            | Declaration::Function { header, .. }
            | Declaration::Struct { header, .. }
            | Declaration::Enum { header, .. }
            | Declaration::Trait { header, .. }
            | Declaration::Interface { header, .. }
            | Declaration::Impl { header, .. }
            | Declaration::Macro { header }
            | Declaration::Const { header }
            | Declaration::TypeAlias { header } => header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn kind(&self) -> InterfaceKind {
        match self {
            Declaration::Class { .. } => InterfaceKind::Class,
            Declaration::Function { .. } => InterfaceKind::Function,
            Declaration::Struct { .. } => InterfaceKind::Struct,
            Declaration::Enum { .. } => InterfaceKind::Enum,
            Declaration::Trait { .. } => InterfaceKind::Trait,
            Declaration::Interface { .. } => InterfaceKind::Interface,
            Declaration::Impl { .. } => InterfaceKind::Impl,
            Declaration::Macro { .. } => InterfaceKind::Macro,
            Declaration::Const { .. } => InterfaceKind::Const,
            Declaration::TypeAlias { .. } => InterfaceKind::TypeAlias,
        }
    }

    /// Project onto the language-agnostic [`Interface`].
    pub fn into_interface(self) -> Interface {
        let kind = self.kind();
        let (header, members) = match self {
            Declaration::Class { header, methods, .. }
            | Declaration::Trait { header, methods }
            | Declaration::Interface { header, methods }
            | Declaration::Impl { header, methods, .. } => (header, methods),
            Declaration::Struct { header, fields } => (header, fields),
            Declaration::Enum { header, variants } => (header, variants),
            Declaration::Function { header, .. }
            | Declaration::Macro { header }
            | Declaration::Const { header }
            | Declaration::TypeAlias { header } => (header, Vec::new()),
        };
        Interface {
            name: header.name,
            kind,
            signature: header.signature,
            doc: header.doc,
            members,
            line: header.line,
        }
    }
}

/// Everything a parser extracts from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub summary: String,
    pub imports: Vec<Import>,
    pub declarations: Vec<Declaration>,
    pub line_count: u32,
    pub fidelity: Fidelity,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("file is not valid UTF-8")]
    NotUtf8,

    #[error("cannot load grammar: {0}")]
    Grammar(String),

    #[error("parser produced no tree")]
    NoTree,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-language parsing.
pub trait LanguageParser {
    fn language(&self) -> Language;

    fn fidelity(&self) -> Fidelity;

    /// Parse one file. `path` is the project-relative module path.
    fn parse(&self, pool: &mut ParserPool, path: &str, source: &str) -> Result<ParsedFile, ParseError>;
}

/// Number of lines, counting a final line without a newline.
pub fn count_lines(source: &str) -> u32 {
    source.lines().count() as u32
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty line of a doc block, truncated to [`SUMMARY_MAX_CHARS`].
pub fn first_doc_line(doc: &str) -> String {
    let line = doc
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    truncate_chars(line, SUMMARY_MAX_CHARS)
}

/// Module summary: the doc line if any, otherwise `Defines A, B, C` from
/// the first three declarations, otherwise empty.
pub fn summarize(module_doc: &str, declarations: &[Declaration]) -> String {
    let line = first_doc_line(module_doc);
    if !line.is_empty() {
        return line;
    }
    let names: Vec<&str> = declarations
        .iter()
        .filter(|d| !matches!(d, Declaration::Impl { .. }))
        .map(Declaration::name)
        .take(3)
        .collect();
    if names.is_empty() {
        String::new()
    } else {
        truncate_chars(&format!("Defines {}", names.join(", ")), SUMMARY_MAX_CHARS)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str) -> Declaration {
        Declaration::Function {
            header: Header::new(name, format!("def {name}()"), 1),
            is_async: false,
        }
    }

    #[test]
    fn test_summary_prefers_doc() {
        let decls = vec![function("a")];
        assert_eq!(summarize("\n  Token helpers.\n\nMore text.", &decls), "Token helpers.");
    }

    #[test]
    fn test_summary_falls_back_to_names() {
        let decls = vec![function("a"), function("b"), function("c"), function("d")];
        assert_eq!(summarize("", &decls), "Defines a, b, c");
        assert_eq!(summarize("", &[]), "");
    }

    #[test]
    fn test_summary_is_truncated() {
        let doc = "x".repeat(300);
        assert_eq!(summarize(&doc, &[]).chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_into_interface_keeps_members() {
        let decl = Declaration::Class {
            header: Header::new("Tokenizer", "class Tokenizer(Base)", 4).with_doc("Split text."),
            bases: vec!["Base".into()],
            methods: vec!["tokenize".into()],
        };
        let interface = decl.into_interface();
        assert_eq!(interface.kind, InterfaceKind::Class);
        assert_eq!(interface.members, vec!["tokenize"]);
        assert_eq!(interface.doc, "Split text.");
        assert_eq!(interface.line, 4);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("fn  f(\n    a: u32,\n)"), "fn f( a: u32, )");
    }
}
