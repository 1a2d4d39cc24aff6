//! Python parser using tree-sitter

use super::{field_text, header_until, line, text};
use crate::parser::{
    Declaration, Fidelity, Header, Import, LanguageParser, ParseError, ParsedFile, count_lines,
    summarize,
};
use crate::parser_pool::{Grammar, ParserPool};
use scion_core::{EdgeKind, Language};
use tree_sitter::Node;

pub struct PythonParser;

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Syntax
    }

    fn parse(&self, pool: &mut ParserPool, _path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let tree = pool.parse(Grammar::Python, source)?;
        let root = tree.root_node();

        let mut imports = Vec::new();
        collect_imports(root, source, &mut imports);

        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if let Some(decl) = declaration(child, source) {
                declarations.push(decl);
            }
        }

        let module_doc = docstring(root, source);
        Ok(ParsedFile {
            summary: summarize(&module_doc, &declarations),
            imports,
            declarations,
            line_count: count_lines(source),
            fidelity: Fidelity::Syntax,
        })
    }
}

/// Every import anywhere in the file, including function-local and
/// conditional ones, in source order.
fn collect_imports(root: Node, source: &str, imports: &mut Vec<Import>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => plain_import(node, source, imports),
            "import_from_statement" => imports.push(from_import(node, source)),
            _ => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }
}

/// `import a.b as c, d`
fn plain_import(node: Node, source: &str, imports: &mut Vec<Import>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (module, alias) = match name.kind() {
            "aliased_import" => (
                field_text(name, "name", source).unwrap_or_default(),
                field_text(name, "alias", source).map(str::to_string),
            ),
            _ => (text(name, source), None),
        };
        imports.push(Import::new(module, EdgeKind::Import, line(node)).with_alias(alias));
    }
}

/// `from ..pkg.mod import a as b, c` or `from . import x`
fn from_import(node: Node, source: &str) -> Import {
    let (module, level) = match node.child_by_field_name("module_name") {
        Some(m) if m.kind() == "relative_import" => {
            let mut cursor = m.walk();
            let mut module = "";
            let mut level = 0;
            for part in m.named_children(&mut cursor) {
                match part.kind() {
                    "import_prefix" => level = text(part, source).matches('.').count() as u32,
                    "dotted_name" => module = text(part, source),
                    _ => {}
                }
            }
            (module, level)
        }
        Some(m) => (text(m, source), 0),
        None => ("", 0),
    };

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let imported = match name.kind() {
            "aliased_import" => field_text(name, "name", source).unwrap_or_default(),
            _ => text(name, source),
        };
        names.push(imported.to_string());
    }
    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import")
    {
        names.push("*".to_string());
    }

    Import::new(module, EdgeKind::FromImport, line(node))
        .with_names(names)
        .with_level(level)
}

fn declaration(node: Node, source: &str) -> Option<Declaration> {
    match node.kind() {
        "decorated_definition" => declaration(node.child_by_field_name("definition")?, source),
        "class_definition" => {
            let body = node.child_by_field_name("body");
            let name = field_text(node, "name", source)?;
            let header = Header::new(name, header_until(node, body, source), line(node))
                .with_doc(body.map(|b| docstring(b, source)).unwrap_or_default());
            let bases = node
                .child_by_field_name("superclasses")
                .map(|args| {
                    let mut cursor = args.walk();
                    args.named_children(&mut cursor)
                        .filter(|a| a.kind() != "keyword_argument")
                        .map(|a| text(a, source).to_string())
                        .collect()
                })
                .unwrap_or_default();
            let methods = body.map(|b| methods(b, source)).unwrap_or_default();
            Some(Declaration::Class { header, bases, methods })
        }
        "function_definition" => {
            let body = node.child_by_field_name("body");
            let name = field_text(node, "name", source)?;
            let header = Header::new(name, header_until(node, body, source), line(node))
                .with_doc(body.map(|b| docstring(b, source)).unwrap_or_default());
            let is_async = text(node, source).starts_with("async");
            Some(Declaration::Function { header, is_async })
        }
        "expression_statement" => {
            let assignment = node.named_child(0).filter(|n| n.kind() == "assignment")?;
            let target = assignment.child_by_field_name("left")?;
            let name = text(target, source);
            if target.kind() != "identifier" || !is_constant_name(name) {
                return None;
            }
            let signature = text(node, source).lines().next().unwrap_or_default().trim();
            Some(Declaration::Const {
                header: Header::new(name, signature, line(node)),
            })
        }
        _ => None,
    }
}

/// Method names defined directly in a class body.
fn methods(body: Node, source: &str) -> Vec<String> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|child| match child.kind() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        })
        .filter_map(|f| field_text(f, "name", source))
        .map(str::to_string)
        .collect()
}

/// The docstring of a module or block: a string as its first statement.
fn docstring(block: Node, source: &str) -> String {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    first
        .filter(|s| s.kind() == "expression_statement")
        .and_then(|s| s.named_child(0))
        .filter(|s| s.kind() == "string")
        .map(|s| string_value(text(s, source)))
        .unwrap_or_default()
}

fn string_value(literal: &str) -> String {
    let body = literal.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body.strip_prefix(quote).and_then(|b| b.strip_suffix(quote)) {
            return inner.trim().to_string();
        }
    }
    body.to_string()
}

/// `MAX_SIZE`, `DEFAULT_TIMEOUT_2`
fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::InterfaceKind;

    fn parse(source: &str) -> ParsedFile {
        PythonParser
            .parse(&mut ParserPool::new(), "pkg/mod.py", source)
            .unwrap()
    }

    #[test]
    fn test_imports() {
        let parsed = parse(
            r#"import os, numpy as np
from collections import OrderedDict, defaultdict as dd
from . import sibling
from ..core.util import *

def lazy():
    import json
"#,
        );
        let summary: Vec<(&str, u32, Vec<String>)> = parsed
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.level, i.names.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("os", 0, vec![]),
                ("numpy", 0, vec![]),
                ("collections", 0, vec!["OrderedDict".to_string(), "defaultdict".to_string()]),
                ("", 1, vec!["sibling".to_string()]),
                ("core.util", 2, vec!["*".to_string()]),
                ("json", 0, vec![]),
            ]
        );
        assert_eq!(parsed.imports[1].alias.as_deref(), Some("np"));
        assert_eq!(parsed.imports[2].kind, EdgeKind::FromImport);
        assert_eq!(parsed.imports[5].line, 7);
    }

    #[test]
    fn test_declarations_and_summary() {
        let parsed = parse(
            r#""""Tokenizing utilities.

Longer description.
"""

MAX_TOKENS = 512
helper_value = 3


class Tokenizer(Base, metaclass=Meta):
    """Split text into tokens."""

    def tokenize(self, text):
        return text.split()

    @staticmethod
    def _reset():
        pass


@cache
async def fetch(url: str) -> bytes:
    """Fetch a URL."""
    ...
"#,
        );
        assert_eq!(parsed.summary, "Tokenizing utilities.");
        assert_eq!(parsed.fidelity, Fidelity::Syntax);

        let kinds: Vec<(&str, InterfaceKind)> = parsed
            .declarations
            .iter()
            .map(|d| (d.name(), d.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("MAX_TOKENS", InterfaceKind::Const),
                ("Tokenizer", InterfaceKind::Class),
                ("fetch", InterfaceKind::Function),
            ]
        );

        match &parsed.declarations[1] {
            Declaration::Class { header, bases, methods } => {
                assert_eq!(header.signature, "class Tokenizer(Base, metaclass=Meta)");
                assert_eq!(header.doc, "Split text into tokens.");
                assert_eq!(bases, &vec!["Base".to_string()]);
                assert_eq!(methods, &vec!["tokenize".to_string(), "_reset".to_string()]);
            }
            other => panic!("expected class, got {other:?}"),
        }
        match &parsed.declarations[2] {
            Declaration::Function { header, is_async } => {
                assert!(*is_async);
                assert_eq!(header.signature, "async def fetch(url: str) -> bytes");
                assert_eq!(header.doc, "Fetch a URL.");
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_fallback() {
        let parsed = parse("def a():\n    pass\n\ndef b():\n    pass\n");
        assert_eq!(parsed.summary, "Defines a, b");
        assert_eq!(parsed.line_count, 5);
    }
}
