//! Classify raw imports as internal modules, external packages, or noise
//!
//! Raw import syntax rarely spells out a file path, so internal matches fall
//! back to suffix matching against the set of walked files.

mod native;
mod python;
mod rust;
mod script;
pub mod stdlib;

use crate::parser::Import;
use scion_core::Language;
use std::collections::BTreeSet;

/// Where an import points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// One or more walked files. Go package imports name every file of the package.
    Internal(Vec<String>),
    /// An external package, by its canonical name.
    External(String),
    /// Part of the language's standard library; not recorded.
    Stdlib,
    /// Neither a walked file nor a recognisable package; not recorded.
    Unresolved,
}

impl Resolution {
    fn internal_or_unresolved(paths: Vec<String>) -> Self {
        if paths.is_empty() {
            Resolution::Unresolved
        } else {
            Resolution::Internal(paths)
        }
    }
}

/// The walked files of one project, for lookups during resolution.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    files: BTreeSet<String>,
    go_module: Option<String>,
}

impl FileIndex {
    pub fn new(files: impl IntoIterator<Item = String>) -> Self {
        FileIndex {
            files: files.into_iter().collect(),
            go_module: None,
        }
    }

    /// Module path declared in `go.mod`, used to recognise local packages.
    pub fn with_go_module(mut self, module: Option<String>) -> Self {
        self.go_module = module;
        self
    }

    pub fn go_module(&self) -> Option<&str> {
        self.go_module.as_deref()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// First candidate that is a walked file.
    pub fn first_existing<I, S>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .find(|c| self.contains(c.as_ref()))
            .map(|c| c.as_ref().to_string())
    }

    /// A file equal to `suffix` or ending in `/suffix`. The shortest path
    /// wins, then the lexicographically smallest.
    pub fn suffix_match(&self, suffix: &str) -> Option<&str> {
        if suffix.is_empty() {
            return None;
        }
        if self.files.contains(suffix) {
            return self.files.get(suffix).map(String::as_str);
        }
        let tail = format!("/{suffix}");
        self.files
            .iter()
            .filter(|f| f.ends_with(&tail))
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(String::as_str)
    }

    /// Files directly inside `dir` (`""` is the root), sorted.
    pub fn files_in_dir<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.files
            .iter()
            .filter(move |f| parent_dir(f) == dir)
            .map(String::as_str)
    }

    /// Files directly inside any directory whose path ends with `dir`.
    pub fn files_in_dir_suffix<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.files
            .iter()
            .filter(move |f| {
                let parent = parent_dir(f);
                parent == dir || parent.ends_with(&format!("/{dir}"))
            })
            .map(String::as_str)
    }
}

/// Resolve one import of `importer` (a module path) written in `language`.
pub fn resolve(language: Language, importer: &str, import: &Import, index: &FileIndex) -> Resolution {
    let resolution = match language {
        Language::Python => python::resolve(importer, import, index),
        Language::Rust => rust::resolve(importer, import, index),
        Language::TypeScript | Language::JavaScript => script::resolve(importer, import, index),
        Language::Go => native::resolve_go(import, index),
        Language::Java => native::resolve_java(import, index),
        Language::C | Language::Cpp => native::resolve_include(importer, import, index),
    };
    // A file never depends on itself.
    match resolution {
        Resolution::Internal(paths) => {
            let mut kept: Vec<String> = Vec::with_capacity(paths.len());
            for path in paths {
                if path != importer && !kept.contains(&path) {
                    kept.push(path);
                }
            }
            Resolution::internal_or_unresolved(kept)
        }
        other => other,
    }
}

/// Directory part of a module path, `""` at the root.
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

pub(crate) fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

/// Collapse `.` and `..` segments. `None` if the path climbs above the root.
pub(crate) fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(files: &[&str]) -> FileIndex {
        FileIndex::new(files.iter().map(|f| f.to_string()))
    }

    #[test]
    fn test_suffix_match_prefers_shortest_then_lexicographic() {
        let files = index(&["b/x/util.py", "a/util.py", "c/util.py", "util.py.bak"]);
        assert_eq!(files.suffix_match("util.py"), Some("a/util.py"));
        assert_eq!(files.suffix_match("x/util.py"), Some("b/x/util.py"));
        assert_eq!(files.suffix_match("til.py"), None);
    }

    #[test]
    fn test_files_in_dir() {
        let files = index(&["pkg/a.go", "pkg/b.go", "pkg/sub/c.go", "main.go"]);
        assert_eq!(files.files_in_dir("pkg").collect::<Vec<_>>(), vec!["pkg/a.go", "pkg/b.go"]);
        assert_eq!(files.files_in_dir("").collect::<Vec<_>>(), vec!["main.go"]);
        assert_eq!(files.files_in_dir_suffix("sub").collect::<Vec<_>>(), vec!["pkg/sub/c.go"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("src/a/../b/./c.ts").as_deref(), Some("src/b/c.ts"));
        assert_eq!(normalize("../outside"), None);
    }
}
