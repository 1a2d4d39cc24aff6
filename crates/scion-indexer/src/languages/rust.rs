//! Rust parser using tree-sitter

use super::{doc_above, field_text, header_until, line, named_child_names, strip_comment_markers, text};
use crate::parser::{
    Declaration, Fidelity, Header, Import, LanguageParser, ParseError, ParsedFile, count_lines,
    summarize,
};
use crate::parser_pool::{Grammar, ParserPool};
use scion_core::{EdgeKind, Language};
use tree_sitter::Node;

const COMMENT_KINDS: &[&str] = &["line_comment", "block_comment"];
const ATTRIBUTE_KINDS: &[&str] = &["attribute_item"];

pub struct RustParser;

impl LanguageParser for RustParser {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Syntax
    }

    fn parse(&self, pool: &mut ParserPool, _path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let tree = pool.parse(Grammar::Rust, source)?;
        let root = tree.root_node();

        let mut imports = Vec::new();
        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for item in root.named_children(&mut cursor) {
            match item.kind() {
                "use_declaration" => {
                    if let Some(argument) = item.child_by_field_name("argument") {
                        imports.extend(use_imports(argument, source, line(item)));
                    }
                }
                "mod_item" if item.child_by_field_name("body").is_none() => {
                    if let Some(name) = field_text(item, "name", source) {
                        imports.push(Import::new(name, EdgeKind::Mod, line(item)));
                    }
                }
                "extern_crate_declaration" => {
                    if let Some(name) = field_text(item, "name", source) {
                        let alias = field_text(item, "alias", source).map(str::to_string);
                        imports.push(Import::new(name, EdgeKind::Use, line(item)).with_alias(alias));
                    }
                }
                _ => {
                    if let Some(decl) = declaration(item, source) {
                        declarations.push(decl);
                    }
                }
            }
        }

        let module_doc = inner_doc(root, source);
        Ok(ParsedFile {
            summary: summarize(&module_doc, &declarations),
            imports,
            declarations,
            line_count: count_lines(source),
            fidelity: Fidelity::Syntax,
        })
    }
}

/// `//!` and `/*! */` comments at the top of the file.
fn inner_doc(root: Node, source: &str) -> String {
    let mut lines = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "line_comment" | "block_comment" => {
                let body = text(child, source);
                if body.starts_with("//!") || body.starts_with("/*!") {
                    lines.push(strip_comment_markers(body));
                } else if !lines.is_empty() {
                    break;
                }
            }
            "inner_attribute_item" => {}
            _ => break,
        }
    }
    lines.join("\n")
}

fn outer_doc(node: Node, source: &str) -> String {
    doc_above(node, source, COMMENT_KINDS, ATTRIBUTE_KINDS, |c| {
        (c.starts_with("///") && !c.starts_with("////")) || c.starts_with("/**")
    })
}

// ── use trees ───────────────────────────────────────────

/// One imported path split into its parent and last segment.
struct UseLeaf {
    parent: String,
    leaf: String,
    alias: Option<String>,
}

/// Flatten a use tree and group leaves by parent path:
/// `use crate::model::{Edge, Module}` becomes one import of `crate::model`
/// naming `Edge` and `Module`.
fn use_imports(argument: Node, source: &str, at: u32) -> Vec<Import> {
    let mut leaves = Vec::new();
    flatten_use(argument, "", source, &mut leaves);

    let mut imports: Vec<Import> = Vec::new();
    for UseLeaf { parent, leaf, alias } in leaves {
        if parent.is_empty() {
            imports.push(Import::new(leaf, EdgeKind::Use, at).with_alias(alias));
            continue;
        }
        match imports.iter_mut().find(|i| i.module == parent && i.alias.is_none()) {
            Some(existing) if alias.is_none() => existing.names.push(leaf),
            _ => imports.push(
                Import::new(parent, EdgeKind::Use, at)
                    .with_names(vec![leaf])
                    .with_alias(alias),
            ),
        }
    }
    imports
}

fn flatten_use(node: Node, prefix: &str, source: &str, out: &mut Vec<UseLeaf>) {
    match node.kind() {
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                flatten_use(child, prefix, source, out);
            }
        }
        "scoped_use_list" => {
            let path = node
                .child_by_field_name("path")
                .map(|p| join_path(prefix, &compact(text(p, source))))
                .unwrap_or_else(|| prefix.to_string());
            if let Some(list) = node.child_by_field_name("list") {
                flatten_use(list, &path, source, out);
            }
        }
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                let full = join_path(prefix, &compact(text(path, source)));
                let alias = field_text(node, "alias", source).map(str::to_string);
                out.push(split_leaf(&full, alias));
            }
        }
        "use_wildcard" => {
            let full = compact(text(node, source));
            let base = full.trim_end_matches('*').trim_end_matches("::");
            out.push(UseLeaf {
                parent: join_path(prefix, base),
                leaf: "*".to_string(),
                alias: None,
            });
        }
        _ => {
            let full = join_path(prefix, &compact(text(node, source)));
            out.push(split_leaf(&full, None));
        }
    }
}

fn split_leaf(full: &str, alias: Option<String>) -> UseLeaf {
    match full.rsplit_once("::") {
        Some((parent, leaf)) => UseLeaf {
            parent: parent.to_string(),
            leaf: leaf.to_string(),
            alias,
        },
        None => UseLeaf {
            parent: String::new(),
            leaf: full.to_string(),
            alias,
        },
    }
}

fn join_path(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}::{rest}"),
    }
}

fn compact(path: &str) -> String {
    path.split_whitespace().collect()
}

// ── items ───────────────────────────────────────────────

fn declaration(item: Node, source: &str) -> Option<Declaration> {
    let body = item.child_by_field_name("body");
    let header = |name: &str| {
        Header::new(name, header_until(item, body, source), line(item)).with_doc(outer_doc(item, source))
    };

    match item.kind() {
        "function_item" => {
            let is_async = item
                .children(&mut item.walk())
                .any(|c| c.kind() == "function_modifiers" && text(c, source).contains("async"));
            Some(Declaration::Function {
                header: header(field_text(item, "name", source)?),
                is_async,
            })
        }
        "struct_item" => {
            let fields = body
                .filter(|b| b.kind() == "field_declaration_list")
                .map(|b| named_child_names(b, &["field_declaration"], "name", source))
                .unwrap_or_default();
            Some(Declaration::Struct {
                header: header(field_text(item, "name", source)?),
                fields,
            })
        }
        "enum_item" => {
            let variants = body
                .map(|b| named_child_names(b, &["enum_variant"], "name", source))
                .unwrap_or_default();
            Some(Declaration::Enum {
                header: header(field_text(item, "name", source)?),
                variants,
            })
        }
        "trait_item" => {
            let methods = body
                .map(|b| named_child_names(b, &["function_signature_item", "function_item"], "name", source))
                .unwrap_or_default();
            Some(Declaration::Trait {
                header: header(field_text(item, "name", source)?),
                methods,
            })
        }
        "impl_item" => {
            let ty = field_text(item, "type", source)?;
            let name = ty.split('<').next().unwrap_or(ty).trim();
            let trait_name = field_text(item, "trait", source).map(str::to_string);
            let methods = body
                .map(|b| named_child_names(b, &["function_item"], "name", source))
                .unwrap_or_default();
            Some(Declaration::Impl {
                header: header(name),
                trait_name,
                methods,
            })
        }
        "macro_definition" => {
            let name = field_text(item, "name", source)?;
            Some(Declaration::Macro {
                header: Header::new(name, format!("macro_rules! {name}"), line(item))
                    .with_doc(outer_doc(item, source)),
            })
        }
        "const_item" | "static_item" => {
            let value = item.child_by_field_name("value");
            let name = field_text(item, "name", source)?;
            Some(Declaration::Const {
                header: Header::new(name, header_until(item, value, source), line(item))
                    .with_doc(outer_doc(item, source)),
            })
        }
        "type_item" => Some(Declaration::TypeAlias {
            header: header(field_text(item, "name", source)?),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::InterfaceKind;

    fn parse(source: &str) -> ParsedFile {
        RustParser
            .parse(&mut ParserPool::new(), "src/lib.rs", source)
            .unwrap()
    }

    #[test]
    fn test_use_trees_are_grouped() {
        let parsed = parse(
            r#"use std::collections::{BTreeMap, HashMap};
use crate::model::{self, Edge as E, graph::Graph};
use super::util::*;
use serde;
extern crate regex;
mod parser;
mod inline { fn hidden() {} }
"#,
        );
        let imports: Vec<(&str, Vec<String>, EdgeKind)> = parsed
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.names.clone(), i.kind))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("std::collections", vec!["BTreeMap".into(), "HashMap".into()], EdgeKind::Use),
                ("crate::model", vec!["self".into()], EdgeKind::Use),
                ("crate::model", vec!["Edge".into()], EdgeKind::Use),
                ("crate::model::graph", vec!["Graph".into()], EdgeKind::Use),
                ("super::util", vec!["*".into()], EdgeKind::Use),
                ("serde", vec![], EdgeKind::Use),
                ("regex", vec![], EdgeKind::Use),
                ("parser", vec![], EdgeKind::Mod),
            ]
        );
        assert_eq!(parsed.imports[2].alias.as_deref(), Some("E"));
    }

    #[test]
    fn test_items() {
        let parsed = parse(
            r#"//! Graph storage.
//! Second line.

/// A node in the graph.
#[derive(Debug)]
pub struct Node {
    pub id: u32,
    label: String,
}

pub enum Kind { A, B }

pub trait Visit {
    fn visit(&self);
}

impl<T> Visit for Wrapper<T> {
    fn visit(&self) {}
}

pub const LIMIT: usize = 10;

pub type Map = std::collections::HashMap<u32, Node>;

macro_rules! node {
    () => {};
}

/// Build a node.
pub async fn build(
    id: u32,
) -> Node {
    todo!()
}
"#,
        );
        assert_eq!(parsed.summary, "Graph storage.");

        let kinds: Vec<(&str, InterfaceKind)> = parsed
            .declarations
            .iter()
            .map(|d| (d.name(), d.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Node", InterfaceKind::Struct),
                ("Kind", InterfaceKind::Enum),
                ("Visit", InterfaceKind::Trait),
                ("Wrapper", InterfaceKind::Impl),
                ("LIMIT", InterfaceKind::Const),
                ("Map", InterfaceKind::TypeAlias),
                ("node", InterfaceKind::Macro),
                ("build", InterfaceKind::Function),
            ]
        );

        match &parsed.declarations[0] {
            Declaration::Struct { header, fields } => {
                assert_eq!(header.doc, "A node in the graph.");
                assert_eq!(header.signature, "pub struct Node");
                assert_eq!(fields, &vec!["id".to_string(), "label".to_string()]);
            }
            other => panic!("expected struct, got {other:?}"),
        }
        match &parsed.declarations[3] {
            Declaration::Impl { trait_name, methods, .. } => {
                assert_eq!(trait_name.as_deref(), Some("Visit"));
                assert_eq!(methods, &vec!["visit".to_string()]);
            }
            other => panic!("expected impl, got {other:?}"),
        }
        match &parsed.declarations[7] {
            Declaration::Function { header, is_async } => {
                assert!(*is_async);
                assert_eq!(header.signature, "pub async fn build( id: u32, ) -> Node");
                assert_eq!(header.doc, "Build a node.");
            }
            other => panic!("expected function, got {other:?}"),
        }
        assert_eq!(parsed.declarations[4].header().signature, "pub const LIMIT: usize");
    }
}
