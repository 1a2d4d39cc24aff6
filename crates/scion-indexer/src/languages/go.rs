//! Go parser using line patterns

use super::{BraceTracker, comment_above, leading_comment, line_signature};
use crate::parser::{
    Declaration, Fidelity, Header, Import, LanguageParser, ParseError, ParsedFile, count_lines,
    summarize,
};
use crate::parser_pool::ParserPool;
use regex::Regex;
use scion_core::{EdgeKind, Language};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static IMPORT_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^import\s+(?:([\w.]+)\s+)?"([^"]+)""#).unwrap());
static IMPORT_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*(?:([\w.]+)\s+)?"([^"]+)""#).unwrap());
static FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^func\s+(?:\(\s*(?:\w+\s+)?\*?\s*(\w+)(?:\[[^\]]*\])?\s*\)\s*)?(\w+)").unwrap()
});
static TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^type\s+(\w+)(?:\[[^\]]*\])?\s+(=\s*)?(struct|interface)?").unwrap());
static CONST_SINGLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^const\s+(\w+)").unwrap());
static BLOCK_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\w+)").unwrap());
static METHOD_SPEC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\w+)\s*\(").unwrap());

pub struct GoParser;

/// What a multi-line block being read belongs to.
enum Block {
    Imports,
    Consts,
    Struct(usize),
    Interface(usize),
}

impl LanguageParser for GoParser {
    fn language(&self) -> Language {
        Language::Go
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Pattern
    }

    fn parse(&self, _pool: &mut ParserPool, _path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut imports = Vec::new();
        let mut declarations: Vec<Declaration> = Vec::new();
        let mut methods: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut block: Option<Block> = None;
        let mut braces = BraceTracker::default();

        for (idx, raw) in lines.iter().enumerate() {
            let at = idx as u32 + 1;
            let depth = braces.advance(raw);
            let trimmed = raw.trim();

            if let Some(current) = &block {
                let closes = match current {
                    Block::Imports | Block::Consts => trimmed.starts_with(')'),
                    Block::Struct(_) | Block::Interface(_) => braces.depth() == 0,
                };
                match current {
                    Block::Imports => {
                        if let Some(caps) = IMPORT_SPEC.captures(raw) {
                            imports.push(go_import(&caps, at));
                        }
                    }
                    Block::Consts => {
                        if let Some(name) = BLOCK_NAME.captures(raw).map(|c| c[1].to_string()) {
                            if !closes && !raw.trim_start().starts_with("//") {
                                declarations.push(Declaration::Const {
                                    header: Header::new(&name, trimmed, at)
                                        .with_doc(comment_above(&lines, idx)),
                                });
                            }
                        }
                    }
                    Block::Struct(i) | Block::Interface(i) if !closes && depth == 1 => {
                        let member = match current {
                            Block::Interface(_) => METHOD_SPEC.captures(raw),
                            _ => BLOCK_NAME.captures(raw),
                        };
                        if let Some(name) = member.map(|c| c[1].to_string()) {
                            if !trimmed.starts_with("//") {
                                push_member(&mut declarations[*i], name);
                            }
                        }
                    }
                    _ => {}
                }
                if closes {
                    block = None;
                }
                continue;
            }

            if depth > 0 {
                continue;
            }

            if trimmed == "import (" {
                block = Some(Block::Imports);
            } else if let Some(caps) = IMPORT_SINGLE.captures(raw) {
                imports.push(go_import(&caps, at));
            } else if trimmed == "const (" {
                block = Some(Block::Consts);
            } else if let Some(caps) = CONST_SINGLE.captures(raw) {
                declarations.push(Declaration::Const {
                    header: Header::new(&caps[1], trimmed, at).with_doc(comment_above(&lines, idx)),
                });
            } else if let Some(caps) = FUNC.captures(raw) {
                let name = caps[2].to_string();
                match caps.get(1) {
                    Some(receiver) => methods.entry(receiver.as_str().to_string()).or_default().push(name),
                    None => declarations.push(Declaration::Function {
                        header: Header::new(name, line_signature(raw), at)
                            .with_doc(comment_above(&lines, idx)),
                        is_async: false,
                    }),
                }
            } else if let Some(caps) = TYPE.captures(raw) {
                let header = Header::new(&caps[1], line_signature(raw), at).with_doc(comment_above(&lines, idx));
                let opens = braces.depth() > 0;
                let index = declarations.len();
                match caps.get(3).map(|m| m.as_str()) {
                    Some("struct") => {
                        declarations.push(Declaration::Struct { header, fields: Vec::new() });
                        if opens {
                            block = Some(Block::Struct(index));
                        }
                    }
                    Some("interface") => {
                        declarations.push(Declaration::Interface { header, methods: Vec::new() });
                        if opens {
                            block = Some(Block::Interface(index));
                        }
                    }
                    _ => declarations.push(Declaration::TypeAlias { header }),
                }
            }
        }

        // Methods are attached to the struct they are declared on.
        for decl in &mut declarations {
            if let Declaration::Struct { header, fields } = decl {
                if let Some(names) = methods.remove(&header.name) {
                    fields.extend(names);
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

fn go_import(caps: &regex::Captures<'_>, at: u32) -> Import {
    let alias = caps.get(1).map(|m| m.as_str().to_string());
    Import::new(&caps[2], EdgeKind::Import, at).with_alias(alias)
}

fn push_member(decl: &mut Declaration, name: String) {
    match decl {
        Declaration::Struct { fields, .. } => fields.push(name),
        Declaration::Interface { methods, .. } => methods.push(name),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::InterfaceKind;

    const SOURCE: &str = r#"// Package store keeps records.
package store

import "fmt"
import (
	"strings"
	log "github.com/sirupsen/logrus"
	"example.com/app/internal/util"
)

const Version = "1"

const (
	// Small is tiny.
	Small = 1
	Large = 2
)

// Record is one stored row.
type Record struct {
	ID   int
	Name string
}

type Reader interface {
	Read(id int) (Record, error)
}

type ID = int

// Open opens a store.
func Open(path string) (*Store, error) {
	if path == "" {
		return nil, fmt.Errorf("empty")
	}
	return nil, nil
}

func (r *Record) Validate() error {
	return nil
}
"#;

    #[test]
    fn test_go_imports() {
        let parsed = GoParser.parse(&mut ParserPool::new(), "store/store.go", SOURCE).unwrap();
        let modules: Vec<&str> = parsed.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(
            modules,
            vec!["fmt", "strings", "github.com/sirupsen/logrus", "example.com/app/internal/util"]
        );
        assert_eq!(parsed.imports[2].alias.as_deref(), Some("log"));
        assert_eq!(parsed.fidelity, Fidelity::Pattern);
    }

    #[test]
    fn test_go_declarations() {
        let parsed = GoParser.parse(&mut ParserPool::new(), "store/store.go", SOURCE).unwrap();
        assert_eq!(parsed.summary, "Package store keeps records.");

        let kinds: Vec<(&str, InterfaceKind)> = parsed
            .declarations
            .iter()
            .map(|d| (d.name(), d.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Version", InterfaceKind::Const),
                ("Small", InterfaceKind::Const),
                ("Large", InterfaceKind::Const),
                ("Record", InterfaceKind::Struct),
                ("Reader", InterfaceKind::Interface),
                ("ID", InterfaceKind::TypeAlias),
                ("Open", InterfaceKind::Function),
            ]
        );

        let record = parsed.declarations[3].clone().into_interface();
        assert_eq!(record.doc, "Record is one stored row.");
        assert_eq!(record.members, vec!["ID", "Name", "Validate"]);
        let reader = parsed.declarations[4].clone().into_interface();
        assert_eq!(reader.members, vec!["Read"]);
        assert_eq!(parsed.declarations[1].header().doc, "Small is tiny.");
        assert_eq!(parsed.declarations[6].header().signature, "func Open(path string) (*Store, error)");
    }
}
