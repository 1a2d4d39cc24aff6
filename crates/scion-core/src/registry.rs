//! Project registry: project name -> root path and declared language
//!
//! The registry is owned by the calling layer and handed to whatever needs to
//! turn a project name into a path. Nothing in scion writes it.

use crate::error::{Error, Result};
use crate::model::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

/// Read-only lookup of registered projects.
pub trait ProjectLookup {
    fn project(&self, name: &str) -> Result<&ProjectEntry>;

    fn root(&self, name: &str) -> Result<&Path> {
        Ok(self.project(name)?.root.as_path())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    #[serde(default)]
    projects: BTreeMap<String, ProjectEntry>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, name: impl Into<String>, entry: ProjectEntry) -> Self {
        self.projects.insert(name.into(), entry);
        self
    }

    /// Parse a registry document:
    ///
    /// ```toml
    /// [projects.billing]
    /// root = "/src/billing"
    /// language = "python"
    /// ```
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found("registry", path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_toml(&text)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl ProjectLookup for ProjectRegistry {
    fn project(&self, name: &str) -> Result<&ProjectEntry> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::not_found("project", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = ProjectRegistry::from_toml(
            r#"
[projects.billing]
root = "/src/billing"
language = "python"

[projects.web]
root = "/src/web"
"#,
        )
        .unwrap();

        let billing = registry.project("billing").unwrap();
        assert_eq!(billing.root, PathBuf::from("/src/billing"));
        assert_eq!(billing.language, Some(Language::Python));
        assert_eq!(registry.project("web").unwrap().language, None);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["billing", "web"]);
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let registry = ProjectRegistry::new();
        assert!(registry.root("ghost").unwrap_err().is_not_found());
    }
}
