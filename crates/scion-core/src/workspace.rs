//! Project language detection from manifest files

use crate::model::Language;
use std::path::Path;

/// Manifest files that mark a project's language, in detection order.
const MANIFESTS: &[(&str, Language)] = &[
    ("Cargo.toml", Language::Rust),
    ("tsconfig.json", Language::TypeScript),
    ("package.json", Language::JavaScript),
    ("go.mod", Language::Go),
    ("pyproject.toml", Language::Python),
    ("setup.py", Language::Python),
    ("requirements.txt", Language::Python),
    ("pom.xml", Language::Java),
    ("build.gradle", Language::Java),
    ("build.gradle.kts", Language::Java),
    ("CMakeLists.txt", Language::Cpp),
    ("Makefile", Language::C),
];

/// Every language with a manifest at the root, deduplicated, in detection order.
pub fn detect_languages(root: &Path) -> Vec<Language> {
    let mut found = Vec::new();
    for (file, language) in MANIFESTS {
        if root.join(file).is_file() && !found.contains(language) {
            found.push(*language);
        }
    }
    found
}

/// The primary language of a project root, if any manifest identifies one.
pub fn detect_language(root: &Path) -> Option<Language> {
    detect_languages(root).into_iter().next()
}

/// The file that declares external dependencies for a language.
pub fn manifest_file(language: Language) -> &'static str {
    match language {
        Language::Python => "requirements.txt",
        Language::Rust => "Cargo.toml",
        Language::TypeScript | Language::JavaScript => "package.json",
        Language::Go => "go.mod",
        Language::Java => "pom.xml",
        Language::C | Language::Cpp => "CMakeLists.txt",
    }
}
