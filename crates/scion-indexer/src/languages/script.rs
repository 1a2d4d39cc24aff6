//! TypeScript and JavaScript parser using tree-sitter
//!
//! One walker serves both languages; the grammar is picked from the file
//! extension so `.tsx` and `.jsx` get JSX support.

use super::{doc_above, field_text, header_until, leading_comment, line, named_child_names, text};
use crate::parser::{
    Declaration, Fidelity, Header, Import, LanguageParser, ParseError, ParsedFile, count_lines,
    summarize,
};
use crate::parser_pool::{Grammar, ParserPool};
use scion_core::{EdgeKind, Language};
use std::path::Path;
use tree_sitter::Node;

pub struct ScriptParser {
    language: Language,
}

impl ScriptParser {
    pub fn typescript() -> Self {
        ScriptParser {
            language: Language::TypeScript,
        }
    }

    pub fn javascript() -> Self {
        ScriptParser {
            language: Language::JavaScript,
        }
    }

    fn grammar(&self, path: &str) -> Grammar {
        Grammar::from_path(Path::new(path)).unwrap_or(match self.language {
            Language::TypeScript => Grammar::TypeScript,
            _ => Grammar::JavaScript,
        })
    }
}

impl LanguageParser for ScriptParser {
    fn language(&self) -> Language {
        self.language
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Syntax
    }

    fn parse(&self, pool: &mut ParserPool, path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let tree = pool.parse(self.grammar(path), source)?;
        let root = tree.root_node();

        let mut imports = Vec::new();
        collect_imports(root, source, &mut imports);

        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            declarations.extend(
                statement_declarations(statement, source)
                    .into_iter()
                    .filter(|d| self.language.admits(d.kind())),
            );
        }

        let body = source.strip_prefix("#!").map_or(source, |rest| {
            rest.split_once('\n').map_or("", |(_, after)| after)
        });
        Ok(ParsedFile {
            summary: summarize(&leading_comment(body), &declarations),
            imports,
            declarations,
            line_count: count_lines(source),
            fidelity: Fidelity::Syntax,
        })
    }
}

// ── imports ─────────────────────────────────────────────

/// Static imports, re-exports, `require()` and dynamic `import()` calls.
fn collect_imports(root: Node, source: &str, imports: &mut Vec<Import>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                if let Some(import) = static_import(node, source) {
                    imports.push(import);
                }
                continue;
            }
            "export_statement" => {
                if let Some(from) = node.child_by_field_name("source") {
                    let names = node
                        .named_children(&mut node.walk())
                        .find(|c| c.kind() == "export_clause")
                        .map(|clause| named_child_names(clause, &["export_specifier"], "name", source))
                        .unwrap_or_else(|| vec!["*".to_string()]);
                    imports.push(
                        Import::new(string_value(text(from, source)), EdgeKind::Import, line(node))
                            .with_names(names),
                    );
                    continue;
                }
            }
            "call_expression" => {
                if let Some(import) = require_call(node, source) {
                    imports.push(import);
                }
            }
            _ => {}
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

/// `import d, { a as b } from "x"`, `import * as ns from "x"`, `import "x"`,
/// `import x = require("x")`.
fn static_import(node: Node, source: &str) -> Option<Import> {
    let from = node.child_by_field_name("source").or_else(|| {
        node.named_children(&mut node.walk())
            .find(|c| c.kind() == "import_require_clause")
            .and_then(|c| c.child_by_field_name("source"))
    })?;

    let mut names = Vec::new();
    let mut alias = None;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                let mut clause_cursor = child.walk();
                for part in child.named_children(&mut clause_cursor) {
                    match part.kind() {
                        "identifier" => names.push(text(part, source).to_string()),
                        "namespace_import" => {
                            alias = part
                                .named_child(0)
                                .map(|n| text(n, source).to_string());
                        }
                        "named_imports" => names.extend(named_child_names(
                            part,
                            &["import_specifier"],
                            "name",
                            source,
                        )),
                        _ => {}
                    }
                }
            }
            "import_require_clause" => {
                alias = child.named_child(0).map(|n| text(n, source).to_string());
            }
            _ => {}
        }
    }

    Some(
        Import::new(string_value(text(from, source)), EdgeKind::Import, line(node))
            .with_names(names)
            .with_alias(alias),
    )
}

/// `require("x")` or `import("x")` with a literal argument.
fn require_call(node: Node, source: &str) -> Option<Import> {
    let function = node.child_by_field_name("function")?;
    let is_require = function.kind() == "import"
        || (function.kind() == "identifier" && text(function, source) == "require");
    if !is_require {
        return None;
    }
    let argument = node.child_by_field_name("arguments")?.named_child(0)?;
    if argument.kind() != "string" {
        return None;
    }
    Some(Import::new(string_value(text(argument, source)), EdgeKind::Require, line(node)))
}

fn string_value(literal: &str) -> String {
    literal.trim_matches(['"', '\'', '`']).to_string()
}

// ── declarations ────────────────────────────────────────

fn statement_declarations(statement: Node, source: &str) -> Vec<Declaration> {
    let (node, exported) = match statement.kind() {
        "export_statement" => match statement
            .child_by_field_name("declaration")
            .or_else(|| statement.child_by_field_name("value"))
        {
            Some(decl) => (decl, true),
            None => return Vec::new(),
        },
        _ => (statement, false),
    };
    let doc = doc_above(statement, source, &["comment"], &[], |c| c.starts_with("/**"));

    let single = |decl: Option<Declaration>| decl.into_iter().collect::<Vec<_>>();
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" | "class" => {
            let body = node.child_by_field_name("body");
            let Some(name) = field_text(node, "name", source) else {
                return Vec::new();
            };
            let methods = body
                .map(|b| named_child_names(b, &["method_definition", "abstract_method_signature"], "name", source))
                .unwrap_or_default();
            let bases = node
                .named_children(&mut node.walk())
                .find(|c| c.kind() == "class_heritage")
                .map(|h| vec![text(h, source).trim_start_matches("extends").trim().to_string()])
                .unwrap_or_default();
            single(Some(Declaration::Class {
                header: Header::new(name, header_until(node, body, source), line(node)).with_doc(doc),
                bases,
                methods,
            }))
        }
        "function_declaration" | "generator_function_declaration" | "function_expression" => {
            let body = node.child_by_field_name("body");
            single(field_text(node, "name", source).map(|name| Declaration::Function {
                header: Header::new(name, header_until(node, body, source), line(node)).with_doc(doc),
                is_async: text(node, source).starts_with("async"),
            }))
        }
        "lexical_declaration" | "variable_declaration" => {
            variable_declarations(node, source, exported, &doc)
        }
        "interface_declaration" => {
            let body = node.child_by_field_name("body");
            let methods = body
                .map(|b| named_child_names(b, &["method_signature", "property_signature"], "name", source))
                .unwrap_or_default();
            single(field_text(node, "name", source).map(|name| Declaration::Interface {
                header: Header::new(name, header_until(node, body, source), line(node)).with_doc(doc),
                methods,
            }))
        }
        "type_alias_declaration" => single(field_text(node, "name", source).map(|name| {
            Declaration::TypeAlias {
                header: Header::new(name, header_until(node, None, source), line(node)).with_doc(doc),
            }
        })),
        "enum_declaration" => {
            let body = node.child_by_field_name("body");
            let variants = body
                .map(|b| {
                    let mut cursor = b.walk();
                    b.named_children(&mut cursor)
                        .filter_map(|v| match v.kind() {
                            "property_identifier" => Some(text(v, source).to_string()),
                            "enum_assignment" => field_text(v, "name", source).map(str::to_string),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            single(field_text(node, "name", source).map(|name| Declaration::Enum {
                header: Header::new(name, header_until(node, body, source), line(node)).with_doc(doc),
                variants,
            }))
        }
        _ => Vec::new(),
    }
}

/// `const f = (a) => ...` is a function; other exported `const` bindings
/// are constants. Plain `let`/`var` and unexported values are skipped.
fn variable_declarations(node: Node, source: &str, exported: bool, doc: &str) -> Vec<Declaration> {
    let is_const = text(node, source).starts_with("const");
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| text(n, source))
        else {
            continue;
        };
        let value = declarator.child_by_field_name("value");
        match value.map(|v| v.kind()) {
            Some("arrow_function" | "function_expression" | "function") => {
                let function = value.and_then(|v| v.child_by_field_name("body"));
                let signature = header_until(node, function, source)
                    .trim_end_matches("=>")
                    .trim_end()
                    .to_string();
                let is_async = value.is_some_and(|v| text(v, source).starts_with("async"));
                out.push(Declaration::Function {
                    header: Header::new(name, signature, line(declarator)).with_doc(doc),
                    is_async,
                });
            }
            _ if is_const && exported => {
                out.push(Declaration::Const {
                    header: Header::new(name, header_until(node, value, source), line(declarator))
                        .with_doc(doc),
                });
            }
            _ => {}
        }
    }
    out
}
