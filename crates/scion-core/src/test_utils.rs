//! Test utilities for scion

use crate::code_ref::CodeRef;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create a temporary repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        write_file(root, path, content);
    }

    temp_dir
}

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, path: &str, content: &str) {
    let full_path = root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full_path, content).unwrap();
}

/// A small Python project: `pkg/app.py -> pkg/service.py -> pkg/util.py`,
/// plus an unrelated `scripts/tool.py`.
pub fn create_python_repo() -> TempDir {
    create_repo_with_structure(&[
        ("requirements.txt", "requests\n"),
        (
            "pkg/__init__.py",
            "",
        ),
        (
            "pkg/util.py",
            r#""""String helpers."""

import re


def slugify(text):
    """Lowercase and dash-join words."""
    return re.sub(r"\W+", "-", text).lower()
"#,
        ),
        (
            "pkg/service.py",
            r#""""Token service built on the helpers."""

import requests
from .util import slugify


class Tokenizer:
    """Split text into tokens."""

    def tokenize(self, text):
        return slugify(text).split("-")

    def _reset(self):
        pass
"#,
        ),
        (
            "pkg/app.py",
            r#""""Application entry point."""

from pkg.service import Tokenizer


def main():
    print(Tokenizer().tokenize("Hello World"))
"#,
        ),
        (
            "scripts/tool.py",
            r#"import os


def run():
    return os.getcwd()
"#,
        ),
    ])
}

/// Move a file's modification time forward without touching its content.
pub fn bump_mtime(root: &Path, path: &str, secs: u64) {
    let full_path = root.join(path);
    let current = fs::metadata(&full_path).unwrap().modified().unwrap();
    let later = current
        .checked_add(Duration::from_secs(secs))
        .unwrap_or_else(SystemTime::now);
    filetime::set_file_mtime(&full_path, filetime::FileTime::from_system_time(later)).unwrap();
}

/// Rewrite a file and make sure its mtime differs from any captured [`CodeRef`].
pub fn edit_file(root: &Path, path: &str, content: &str) {
    write_file(root, path, content);
    bump_mtime(root, path, 5);
}

/// Capture a reference, panicking on failure.
pub fn code_ref(root: &Path, path: &str) -> CodeRef {
    CodeRef::capture(root, path).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_python_repo() {
        let temp_dir = create_python_repo();
        let root = temp_dir.path();

        assert!(root.join("pkg/service.py").exists());
        assert!(root.join("scripts/tool.py").exists());
        assert!(root.join("requirements.txt").exists());
    }
}
