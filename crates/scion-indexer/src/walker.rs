//! Project tree walking
//!
//! Collects the source files of one language family below a project root,
//! skipping version control, build output, and vendored code.

use ignore::WalkBuilder;
use scion_core::{Error, Language, Result, module_path};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Directory names never descended into.
pub const DENYLIST: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".scion",
    "node_modules",
    "target",
    "build",
    "dist",
    "out",
    "vendor",
    "third_party",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".next",
    ".gradle",
    "coverage",
];

/// One file selected for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Project-relative, `/`-separated.
    pub module_path: String,
    pub language: Language,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    language: Language,
    excludes: BTreeSet<String>,
}

impl Walker {
    pub fn new(root: impl AsRef<Path>, language: Language) -> Self {
        Walker {
            root: root.as_ref().to_path_buf(),
            language,
            excludes: DENYLIST.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Skip these directory names as well as the built-in denylist.
    pub fn with_excludes(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.excludes.extend(extra);
        self
    }

    /// Files of the walker's language family, sorted by path.
    pub fn files(&self) -> Result<Vec<SourceFile>> {
        if !self.root.is_dir() {
            return Err(Error::not_found("project root", self.root.display().to_string()));
        }

        let excludes = self.excludes.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir && entry.depth() > 0 && excludes.contains(entry.file_name().to_string_lossy().as_ref()))
            });

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.path();
            let Some(language) = Language::from_path(path) else {
                continue;
            };
            if !self.language.covers(language) {
                continue;
            }
            let Some(module_path) = module_path(&self.root, path) else {
                continue;
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(SourceFile {
                path: path.to_path_buf(),
                module_path,
                language,
                size,
            });
        }

        files.sort_by(|a, b| a.module_path.cmp(&b.module_path));
        tracing::debug!("Walked {} {} files under {}", files.len(), self.language, self.root.display());
        Ok(files)
    }
}
