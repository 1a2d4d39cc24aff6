//! Parsers for each supported language
//!
//! Python, Rust and TypeScript/JavaScript walk a tree-sitter syntax tree.
//! Go, Java and C/C++ are read line by line with regexes.

pub mod c;
pub mod go;
pub mod java;
pub mod python;
pub mod rust;
pub mod script;

use crate::parser::{LanguageParser, collapse_whitespace};
use scion_core::Language;
use tree_sitter::Node;

/// Get the parser for a language
pub fn parser_for(language: Language) -> Box<dyn LanguageParser> {
    match language {
        Language::Python => Box::new(python::PythonParser),
        Language::Rust => Box::new(rust::RustParser),
        Language::TypeScript => Box::new(script::ScriptParser::typescript()),
        Language::JavaScript => Box::new(script::ScriptParser::javascript()),
        Language::Go => Box::new(go::GoParser),
        Language::Java => Box::new(java::JavaParser),
        Language::C => Box::new(c::CParser::c()),
        Language::Cpp => Box::new(c::CParser::cpp()),
    }
}

// ── Syntax tree helpers ─────────────────────────────────

pub(crate) fn text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

pub(crate) fn field_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| text(n, source))
}

/// 1-based line of a node.
pub(crate) fn line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Declaration text from its start up to `end` (usually the body), with
/// whitespace collapsed and a trailing `:`, `{` or `=` removed.
pub(crate) fn header_until(node: Node, end: Option<Node>, source: &str) -> String {
    let stop = end.map_or(node.end_byte(), |e| e.start_byte());
    let raw = source.get(node.start_byte()..stop).unwrap_or_default();
    let header = collapse_whitespace(raw);
    header
        .trim_end_matches([':', '{', '=', ';'])
        .trim_end()
        .to_string()
}

/// Text of the named children of a node, for member lists.
pub(crate) fn named_child_names(node: Node, kinds: &[&str], field: &str, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| kinds.contains(&c.kind()))
        .filter_map(|c| field_text(c, field, source))
        .map(str::to_string)
        .collect()
}

/// Doc comments directly above a node, markers stripped.
///
/// `accept` decides which comment texts count as docs (`///` in Rust,
/// `/**` in TypeScript). Attribute-like siblings listed in `skip` are
/// stepped over.
pub(crate) fn doc_above(
    node: Node,
    source: &str,
    comment_kinds: &[&str],
    skip: &[&str],
    accept: fn(&str) -> bool,
) -> String {
    let mut lines = Vec::new();
    let mut current = node.prev_named_sibling();
    let mut expected_row = node.start_position().row;
    while let Some(sibling) = current {
        if skip.contains(&sibling.kind()) {
            expected_row = sibling.start_position().row;
            current = sibling.prev_named_sibling();
            continue;
        }
        if !comment_kinds.contains(&sibling.kind()) {
            break;
        }
        let body = text(sibling, source);
        if !accept(body) || sibling.end_position().row + 1 < expected_row {
            break;
        }
        lines.push(strip_comment_markers(body));
        expected_row = sibling.start_position().row;
        current = sibling.prev_named_sibling();
    }
    lines.reverse();
    lines.join("\n").trim().to_string()
}

// ── Comment text helpers ────────────────────────────────

/// Remove `//`, `///`, `//!`, `/*`, `/**`, `*/` and leading `*` from comment text.
pub(crate) fn strip_comment_markers(comment: &str) -> String {
    comment
        .lines()
        .map(|l| {
            let l = l.trim();
            let l = l
                .strip_prefix("/**")
                .or_else(|| l.strip_prefix("/*!"))
                .or_else(|| l.strip_prefix("/*"))
                .or_else(|| l.strip_prefix("///"))
                .or_else(|| l.strip_prefix("//!"))
                .or_else(|| l.strip_prefix("//"))
                .unwrap_or(l);
            let l = l.strip_suffix("*/").unwrap_or(l).trim();
            let l = l.strip_prefix('*').unwrap_or(l);
            l.trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// The comment block at the very top of a file, before any code.
pub(crate) fn leading_comment(source: &str) -> String {
    let mut block = Vec::new();
    let mut in_block = false;
    for raw in source.lines() {
        let line = raw.trim();
        if in_block {
            block.push(line);
            if line.contains("*/") {
                in_block = false;
            }
            continue;
        }
        if line.is_empty() {
            if block.is_empty() {
                continue;
            }
            break;
        }
        if line.starts_with("//") {
            block.push(line);
        } else if line.starts_with("/*") {
            block.push(line);
            in_block = !line.contains("*/");
        } else {
            break;
        }
    }
    strip_comment_markers(&block.join("\n"))
}

// ── Line scanning helpers for pattern parsers ───────────

/// Tracks brace depth across lines, ignoring braces in strings and comments.
#[derive(Debug, Default)]
pub(crate) struct BraceTracker {
    depth: i32,
    in_block_comment: bool,
}

impl BraceTracker {
    pub(crate) fn depth(&self) -> i32 {
        self.depth
    }

    /// Consume one line and return the depth before it.
    pub(crate) fn advance(&mut self, line: &str) -> i32 {
        let before = self.depth;
        let mut chars = line.chars().peekable();
        let mut quote: Option<char> = None;
        while let Some(c) = chars.next() {
            if self.in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }
            if let Some(q) = quote {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' | '`' => quote = Some(c),
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_block_comment = true;
                }
                '{' => self.depth += 1,
                '}' => self.depth = (self.depth - 1).max(0),
                _ => {}
            }
        }
        before
    }
}

/// Comment lines directly above `idx`, markers stripped.
pub(crate) fn comment_above(lines: &[&str], idx: usize) -> String {
    let mut collected = Vec::new();
    let mut i = idx;
    while i > 0 {
        i -= 1;
        let line = lines[i].trim();
        let is_comment = line.starts_with("//")
            || line.starts_with("/*")
            || line.starts_with('*')
            || line.ends_with("*/");
        if !is_comment || line.is_empty() {
            break;
        }
        collected.push(line);
    }
    collected.reverse();
    strip_comment_markers(&collected.join("\n"))
}

/// Whether a line at depth 0 is blank or a comment.
pub(crate) fn is_trivia(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

/// A one-line signature: text before the first `{`, whitespace collapsed.
pub(crate) fn line_signature(line: &str) -> String {
    let head = line.split('{').next().unwrap_or(line);
    collapse_whitespace(head).trim_end_matches(';').trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_every_language() {
        use crate::parser::Fidelity;
        let tiers = [
            (Language::Python, Fidelity::Syntax),
            (Language::Rust, Fidelity::Syntax),
            (Language::TypeScript, Fidelity::Syntax),
            (Language::JavaScript, Fidelity::Syntax),
            (Language::Go, Fidelity::Pattern),
            (Language::Java, Fidelity::Pattern),
            (Language::C, Fidelity::Pattern),
            (Language::Cpp, Fidelity::Pattern),
        ];
        for (language, tier) in tiers {
            let parser = parser_for(language);
            assert_eq!(parser.language(), language);
            assert_eq!(parser.fidelity(), tier, "{language}");
        }
    }

    #[test]
    fn test_strip_comment_markers() {
        assert_eq!(strip_comment_markers("/// Adds two numbers."), "Adds two numbers.");
        assert_eq!(
            strip_comment_markers("/**\n * Parse input.\n * Fast.\n */"),
            "Parse input.\nFast."
        );
        assert_eq!(strip_comment_markers("//! Crate docs"), "Crate docs");
    }

    #[test]
    fn test_leading_comment() {
        let source = "\n// Package util has helpers.\n// Second line.\n\npackage util\n";
        assert_eq!(leading_comment(source), "Package util has helpers.\nSecond line.");
        assert_eq!(leading_comment("package util\n// late"), "");
        assert_eq!(leading_comment("/* Block\n   doc */\nint x;"), "Block\ndoc");
    }

    #[test]
    fn test_brace_tracker_ignores_strings_and_comments() {
        let mut tracker = BraceTracker::default();
        assert_eq!(tracker.advance("class A {"), 0);
        assert_eq!(tracker.advance("  String s = \"{{\"; // }"), 1);
        assert_eq!(tracker.advance("  /* { */ void f() {"), 1);
        assert_eq!(tracker.depth(), 2);
        tracker.advance("  }");
        tracker.advance("}");
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_comment_above() {
        let lines = ["", "// Adds.", "// Twice.", "func Add() {}"];
        assert_eq!(comment_above(&lines, 3), "Adds.\nTwice.");
        assert_eq!(comment_above(&lines, 1), "");
    }
}
