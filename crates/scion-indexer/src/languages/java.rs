//! Java parser using line patterns

use super::{BraceTracker, comment_above, leading_comment, line_signature};
use crate::parser::{
    Declaration, Fidelity, Header, Import, LanguageParser, ParseError, ParsedFile, count_lines,
    summarize,
};
use crate::parser_pool::ParserPool;
use regex::Regex;
use scion_core::{EdgeKind, Language};
use std::sync::LazyLock;

static IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*import\s+(static\s+)?([\w.]+?)(\.\*)?\s*;").unwrap());
static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|protected|private|abstract|final|static|sealed|non-sealed|strictfp)\s+)*(class|interface|enum|record|@interface)\s+(\w+)",
    )
    .unwrap()
});
static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:@\w+\s+)*(?:[\w<>\[\],.?]+\s+)+?(\w+)\s*\(").unwrap()
});

/// Words that look like a method name to [`METHOD`] but start a statement.
const NOT_METHODS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "new", "else", "throw"];

pub struct JavaParser;

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Pattern
    }

    fn parse(&self, _pool: &mut ParserPool, _path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut imports = Vec::new();
        let mut declarations: Vec<Declaration> = Vec::new();
        let mut braces = BraceTracker::default();

        for (idx, raw) in lines.iter().enumerate() {
            let at = idx as u32 + 1;
            let depth = braces.advance(raw);

            if depth == 0 {
                if let Some(caps) = IMPORT.captures(raw) {
                    let module = caps[2].to_string();
                    let names = match caps.get(3) {
                        Some(_) => vec!["*".to_string()],
                        None => module.rsplit('.').next().map(str::to_string).into_iter().collect(),
                    };
                    imports.push(Import::new(module, EdgeKind::Import, at).with_names(names));
                } else if let Some(caps) = TYPE_DECL.captures(raw) {
                    let header = Header::new(&caps[2], line_signature(raw), at)
                        .with_doc(comment_above(&lines, idx));
                    declarations.push(match &caps[1] {
                        "interface" | "@interface" => Declaration::Interface { header, methods: Vec::new() },
                        "enum" => Declaration::Enum { header, variants: Vec::new() },
                        _ => Declaration::Class { header, bases: extends(raw), methods: Vec::new() },
                    });
                }
            } else if depth == 1 {
                let Some(owner) = declarations.last_mut() else {
                    continue;
                };
                if let Some(caps) = METHOD.captures(raw) {
                    let name = caps[1].to_string();
                    if NOT_METHODS.contains(&name.as_str()) || raw.trim_start().starts_with("//") {
                        continue;
                    }
                    match owner {
                        Declaration::Class { methods, .. } | Declaration::Interface { methods, .. } => {
                            methods.push(name)
                        }
                        Declaration::Enum { variants, .. } => variants.push(name),
                        _ => {}
                    }
                }
            }
        }

        Ok(ParsedFile {
            summary: summarize(&leading_comment(source), &declarations),
            imports,
            declarations,
            line_count: count_lines(source),
            fidelity: Fidelity::Pattern,
        })
    }
}

/// Supertypes named after `extends` and `implements`.
fn extends(line: &str) -> Vec<String> {
    let head = line.split('{').next().unwrap_or(line);
    let mut bases = Vec::new();
    for keyword in ["extends", "implements"] {
        if let Some((_, rest)) = head.split_once(&format!(" {keyword} ")) {
            let list = rest
                .split(" implements ")
                .next()
                .unwrap_or(rest);
            bases.extend(
                list.split(',')
                    .map(|b| b.trim().split('<').next().unwrap_or_default().to_string())
                    .filter(|b| !b.is_empty()),
            );
        }
    }
    bases
}
