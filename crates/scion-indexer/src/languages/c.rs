//! C and C++ parser using line patterns
//!
//! Includes keep their delimiters (`<stdio.h>`, `"util.h"`) so the resolver
//! can tell system headers from project headers.

use super::{BraceTracker, comment_above, is_trivia, leading_comment, line_signature};
use crate::parser::{
    Declaration, Fidelity, Header, Import, LanguageParser, ParseError, ParsedFile, count_lines,
    summarize,
};
use crate::parser_pool::ParserPool;
use regex::Regex;
use scion_core::{EdgeKind, Language};
use std::sync::LazyLock;

static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*#\s*include\s*([<"][^>"]+[>"])"#).unwrap());
static DEFINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#\s*define\s+(\w+)").unwrap());
static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:typedef\s+)?(?:template\s*<[^>]*>\s*)?(struct|class|union|enum(?:\s+class)?)\s+(\w+)\s*(?::[^{;]*)?(\{|$)")
        .unwrap()
});
static TYPEDEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^typedef\s+.*?(\w+)\s*;\s*$").unwrap());
static USING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^using\s+(\w+)\s*=").unwrap());
static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:template\s*<[^>]*>\s*)?[A-Za-z_][\w\s\*&:<>,]*?[\s\*&]\**&?([A-Za-z_][\w:~]*)\s*\(").unwrap()
});
static MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z_][\w\s\*&:<>,]*?[\s\*&]\**&?(\w+)\s*(?:\[[^\]]*\])?\s*[;(=]").unwrap());
static SCOPE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*(?:namespace\b[^;{]*|extern\s+"C"\s*)\{\s*$"#).unwrap());
static ENUMERATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*(?:=[^,]*)?,?\s*$").unwrap());

const NOT_FUNCTIONS: &[&str] = &["if", "while", "for", "switch", "return", "sizeof", "else"];

pub struct CParser {
    language: Language,
}

impl CParser {
    pub fn c() -> Self {
        CParser { language: Language::C }
    }

    pub fn cpp() -> Self {
        CParser { language: Language::Cpp }
    }
}

impl LanguageParser for CParser {
    fn language(&self) -> Language {
        self.language
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Pattern
    }

    fn parse(&self, _pool: &mut ParserPool, _path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut imports = Vec::new();
        let mut declarations: Vec<Declaration> = Vec::new();
        let mut braces = BraceTracker::default();
        // Index of the record whose body is open at depth 1.
        let mut open_record: Option<usize> = None;

        for (idx, raw) in lines.iter().enumerate() {
            let at = idx as u32 + 1;
            // Namespace and `extern "C"` bodies are read as top level.
            if SCOPE_OPEN.is_match(raw) {
                continue;
            }
            let depth = braces.advance(raw);

            if let Some(caps) = INCLUDE.captures(raw) {
                imports.push(Import::new(&caps[1], EdgeKind::Include, at));
                continue;
            }

            if depth == 1 {
                if let Some(i) = open_record {
                    collect_member(&mut declarations[i], raw);
                }
                continue;
            }
            if depth > 1 {
                continue;
            }
            open_record = None;
            if is_trivia(raw) {
                continue;
            }
            let doc = || comment_above(&lines, idx);

            if let Some(caps) = DEFINE.captures(raw) {
                push_unique(&mut declarations, Declaration::Macro {
                    header: Header::new(&caps[1], raw.trim(), at).with_doc(doc()),
                });
            } else if let Some(caps) = RECORD.captures(raw) {
                let header = Header::new(&caps[2], line_signature(raw), at).with_doc(doc());
                let decl = match &caps[1] {
                    "class" if self.language == Language::Cpp => Declaration::Class {
                        header,
                        bases: Vec::new(),
                        methods: Vec::new(),
                    },
                    "class" => continue,
                    kind if kind.starts_with("enum") => Declaration::Enum { header, variants: Vec::new() },
                    _ => Declaration::Struct { header, fields: Vec::new() },
                };
                let index = push_unique(&mut declarations, decl);
                if braces.depth() == 1 || next_opens(&lines, idx) {
                    open_record = Some(index);
                }
            } else if let Some(caps) = USING.captures(raw).or_else(|| TYPEDEF.captures(raw)) {
                push_unique(&mut declarations, Declaration::TypeAlias {
                    header: Header::new(&caps[1], line_signature(raw), at).with_doc(doc()),
                });
            } else if let Some(caps) = FUNCTION.captures(raw) {
                let name = caps[1].rsplit("::").next().unwrap_or(&caps[1]).to_string();
                if NOT_FUNCTIONS.contains(&name.as_str()) || raw.starts_with(char::is_whitespace) {
                    continue;
                }
                push_unique(&mut declarations, Declaration::Function {
                    header: Header::new(name, line_signature(raw), at).with_doc(doc()),
                    is_async: false,
                });
            }
        }

        declarations.retain(|d| self.language.admits(d.kind()));
        Ok(ParsedFile {
            summary: summarize(&leading_comment(source), &declarations),
            imports,
            declarations,
            line_count: count_lines(source),
            fidelity: Fidelity::Pattern,
        })
    }
}

/// A prototype and its definition are one interface. Returns the index of
/// the stored declaration.
fn push_unique(declarations: &mut Vec<Declaration>, decl: Declaration) -> usize {
    match declarations
        .iter()
        .position(|d| d.kind() == decl.kind() && d.name() == decl.name())
    {
        Some(existing) => existing,
        None => {
            declarations.push(decl);
            declarations.len() - 1
        }
    }
}

/// Allman style: the opening brace on the line after the declaration.
fn next_opens(lines: &[&str], idx: usize) -> bool {
    lines
        .get(idx + 1)
        .is_some_and(|next| next.trim_start().starts_with('{'))
}

fn collect_member(decl: &mut Declaration, line: &str) {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.ends_with(':') {
        return;
    }
    match decl {
        Declaration::Enum { variants, .. } => {
            for part in trimmed.split(',') {
                if let Some(caps) = ENUMERATOR.captures(part) {
                    variants.push(caps[1].to_string());
                }
            }
        }
        Declaration::Struct { fields, .. } => {
            if let Some(caps) = MEMBER.captures(line) {
                fields.push(caps[1].to_string());
            }
        }
        Declaration::Class { methods, .. } => {
            if let Some(caps) = MEMBER.captures(line).filter(|_| line.contains('(')) {
                methods.push(caps[1].to_string());
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::InterfaceKind;

    #[test]
    fn test_c_header_and_source() {
        let source = r#"/* Ring buffer for samples. */
#include <stdio.h>
#include "ring.h"
#include "util/math.h"

#define RING_MAX 64

typedef unsigned int ring_size_t;

enum ring_mode {
    RING_BLOCK,
    RING_DROP = 2,
};

struct ring {
    int head;
    int tail;
    float data[RING_MAX];
};

/* Push one sample. */
int ring_push(struct ring *r, float v);

int ring_push(struct ring *r, float v)
{
    if (r->head == RING_MAX) {
        return -1;
    }
    return 0;
}

static void
helper(void);
"#;
        let parsed = CParser::c().parse(&mut ParserPool::new(), "src/ring.c", source).unwrap();
        assert_eq!(parsed.summary, "Ring buffer for samples.");
        let includes: Vec<&str> = parsed.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(includes, vec!["<stdio.h>", "\"ring.h\"", "\"util/math.h\""]);
        assert!(parsed.imports.iter().all(|i| i.kind == EdgeKind::Include));

        let kinds: Vec<(&str, InterfaceKind)> = parsed
            .declarations
            .iter()
            .map(|d| (d.name(), d.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("RING_MAX", InterfaceKind::Macro),
                ("ring_size_t", InterfaceKind::TypeAlias),
                ("ring_mode", InterfaceKind::Enum),
                ("ring", InterfaceKind::Struct),
                ("ring_push", InterfaceKind::Function),
            ]
        );
        assert_eq!(
            parsed.declarations[2].clone().into_interface().members,
            vec!["RING_BLOCK", "RING_DROP"]
        );
        assert_eq!(
            parsed.declarations[3].clone().into_interface().members,
            vec!["head", "tail", "data"]
        );
        assert_eq!(parsed.declarations[4].header().doc, "Push one sample.");
    }

    #[test]
    fn test_cpp_class() {
        let source = r#"#include <vector>

namespace shop {

class Cart : public Base {
public:
    void add(int item);
    int total() const;
private:
    std::vector<int> items_;
};

using Items = std::vector<int>;

}
"#;
        let parsed = CParser::cpp().parse(&mut ParserPool::new(), "src/cart.hpp", source).unwrap();
        let kinds: Vec<(&str, InterfaceKind)> = parsed
            .declarations
            .iter()
            .map(|d| (d.name(), d.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![("Cart", InterfaceKind::Class), ("Items", InterfaceKind::TypeAlias)]
        );
        assert_eq!(
            parsed.declarations[0].clone().into_interface().members,
            vec!["add", "total"]
        );
    }
}
