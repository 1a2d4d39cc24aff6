//! Core data structures for the dependency graph

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages scion knows how to index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
    TypeScript,
    JavaScript,
    Go,
    Java,
    C,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Python,
        Language::Rust,
        Language::TypeScript,
        Language::JavaScript,
        Language::Go,
        Language::Java,
        Language::C,
        Language::Cpp,
    ];

    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "py" | "pyi" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Whether files of `file` language belong to a project declared as `self`.
    ///
    /// TypeScript projects routinely carry plain JavaScript, and C++ projects
    /// carry C headers and sources.
    pub fn covers(self, file: Language) -> bool {
        self == file
            || matches!(
                (self, file),
                (Language::TypeScript, Language::JavaScript) | (Language::Cpp, Language::C)
            )
    }

    /// Interface kinds a parser for this language may produce.
    pub fn interface_kinds(self) -> &'static [InterfaceKind] {
        use InterfaceKind::*;
        match self {
            Language::Python => &[Class, Function, Const],
            Language::Rust => &[Function, Struct, Enum, Trait, Impl, Macro, Const, TypeAlias],
            Language::TypeScript => &[Class, Function, Interface, Enum, Const, TypeAlias],
            Language::JavaScript => &[Class, Function, Const],
            Language::Go => &[Function, Struct, Interface, Const, TypeAlias],
            Language::Java => &[Class, Interface, Enum],
            Language::C => &[Function, Struct, Enum, Macro, TypeAlias],
            Language::Cpp => &[Class, Function, Struct, Enum, Macro, TypeAlias],
        }
    }

    pub fn admits(self, kind: InterfaceKind) -> bool {
        self.interface_kinds().contains(&kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "javascript" | "js" => Ok(Language::JavaScript),
            "go" | "golang" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            other => Err(crate::Error::not_found("language", other)),
        }
    }
}

/// What kind of construct an interface is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    Class,
    Function,
    Struct,
    Enum,
    Trait,
    Interface,
    Impl,
    Macro,
    Const,
    TypeAlias,
}

impl InterfaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InterfaceKind::Class => "class",
            InterfaceKind::Function => "function",
            InterfaceKind::Struct => "struct",
            InterfaceKind::Enum => "enum",
            InterfaceKind::Trait => "trait",
            InterfaceKind::Interface => "interface",
            InterfaceKind::Impl => "impl",
            InterfaceKind::Macro => "macro",
            InterfaceKind::Const => "const",
            InterfaceKind::TypeAlias => "type_alias",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, usable construct inside a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub kind: InterfaceKind,
    pub signature: String,
    #[serde(default)]
    pub doc: String,
    /// Methods, fields or variants, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    /// 1-based source line.
    pub line: u32,
}

/// Which import syntax produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `import x` (Python, JS/TS, Go, Java)
    Import,
    /// `from x import y`
    FromImport,
    /// Rust `use` and `extern crate`
    Use,
    /// Rust `mod x;`
    Mod,
    /// CommonJS `require()` and dynamic `import()`
    Require,
    /// C/C++ `#include`
    Include,
}

/// A directed dependency from a module to another module or an external package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    /// A module path when internal, an opaque package name otherwise.
    pub target: String,
    pub kind: EdgeKind,
    /// Names brought in by the import statement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specifics: Vec<String>,
}

/// Structural summary of one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Project-relative, `/`-separated.
    pub path: String,
    pub language: Language,
    pub lines: u32,
    pub summary: String,
    pub interfaces: Vec<Interface>,
    pub internal_deps: Vec<String>,
    pub external_deps: Vec<String>,
}

impl Module {
    pub fn new(path: impl Into<String>, language: Language) -> Self {
        Module {
            path: path.into(),
            language,
            lines: 0,
            summary: String::new(),
            interfaces: Vec::new(),
            internal_deps: Vec::new(),
            external_deps: Vec::new(),
        }
    }

    /// File name without directories.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without directories or extension.
    pub fn stem(&self) -> &str {
        let base = self.basename();
        base.split_once('.').map_or(base, |(stem, _)| stem)
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Turn a path under `root` into the `/`-separated module key.
pub fn module_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
