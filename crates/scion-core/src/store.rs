//! On-disk documents under `<root>/.scion/`
//!
//! Every write replaces a whole document: the new content goes to a sibling
//! temporary file which is then renamed over the old one.

use crate::config::ScionConfig;
use crate::error::{Error, Result};
use crate::feature::{Feature, TransplantPlan};
use crate::graph::Graph;
use crate::knowledge::{KnowledgeStore, Learning, RunKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Data directory: .scion/
pub const DATA_DIR: &str = ".scion";

pub const GRAPH_FILE: &str = "graph.json";

pub const KNOWLEDGE_FILE: &str = "knowledge.json";

pub const FEATURES_DIR: &str = "features";

pub const PLANS_DIR: &str = "plans";

/// Key under which older graph documents embedded learnings.
pub const LEGACY_KNOWLEDGE_KEY: &str = "knowledge";

/// Outcome of moving embedded learnings out of a graph document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Entries found in the graph document.
    pub found: usize,
    /// Entries added to the knowledge document.
    pub migrated: usize,
    /// Entries skipped because the knowledge document already had that module.
    pub kept_existing: usize,
}

/// Documents of one project.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
    dir: PathBuf,
    config: ScionConfig,
}

impl ProjectStore {
    /// Open the store of a project root, reading `.scion/config.toml` if present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let dir = root.join(DATA_DIR);
        let config = ScionConfig::load(&dir)?;
        Ok(ProjectStore { root, dir, config })
    }

    pub fn with_config(root: impl AsRef<Path>, config: ScionConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        let dir = root.join(DATA_DIR);
        ProjectStore { root, dir, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &ScionConfig {
        &self.config
    }

    pub fn graph_path(&self) -> PathBuf {
        self.dir.join(GRAPH_FILE)
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.dir.join(KNOWLEDGE_FILE)
    }

    pub fn feature_path(&self, name: &str) -> PathBuf {
        self.dir.join(FEATURES_DIR).join(format!("{}.json", slug(name)))
    }

    pub fn plan_path(&self, feature: &str, target: &str) -> PathBuf {
        self.dir
            .join(PLANS_DIR)
            .join(format!("{}--{}.json", slug(feature), slug(target)))
    }

    // ── Graph ───────────────────────────────────────────────

    pub fn load_graph(&self) -> Result<Option<Graph>> {
        let path = self.graph_path();
        let Some(raw) = read_document::<serde_json::Value>(&path)? else {
            return Ok(None);
        };
        if raw.get(LEGACY_KNOWLEDGE_KEY).is_some() {
            tracing::warn!(
                "{} still embeds knowledge; it will be migrated before the next save",
                path.display()
            );
        }
        let graph: Graph = serde_json::from_value(raw)?;
        tracing::debug!("Graph loaded from: {}", path.display());
        Ok(Some(graph))
    }

    /// Load the graph or fail with `NotFound` if the project was never indexed.
    pub fn require_graph(&self) -> Result<Graph> {
        self.load_graph()?
            .ok_or_else(|| Error::not_found("graph", self.graph_path().display().to_string()))
    }

    /// Replace the graph document. Embedded legacy knowledge is migrated first
    /// so the overwrite cannot lose it.
    pub fn save_graph(&self, graph: &Graph) -> Result<()> {
        self.migrate_legacy_knowledge()?;
        write_document(&self.graph_path(), graph)?;
        tracing::debug!("Graph saved: {}", self.graph_path().display());
        Ok(())
    }

    // ── Knowledge ───────────────────────────────────────────

    /// Load the knowledge document, or an empty one if none exists yet.
    pub fn load_knowledge(&self, project: &str) -> Result<KnowledgeStore> {
        let mut store = read_document::<KnowledgeStore>(&self.knowledge_path())?
            .unwrap_or_else(|| KnowledgeStore::new(project));
        store.set_run_limit(self.config.knowledge.run_history);
        Ok(store)
    }

    pub fn save_knowledge(&self, store: &mut KnowledgeStore) -> Result<()> {
        store.mark_saved();
        write_document(&self.knowledge_path(), store)?;
        tracing::debug!(
            "Knowledge saved: {} learnings -> {}",
            store.learning_count(),
            self.knowledge_path().display()
        );
        Ok(())
    }

    // ── Features and plans ──────────────────────────────────

    pub fn save_feature(&self, feature: &Feature) -> Result<PathBuf> {
        let path = self.feature_path(&feature.name);
        write_document(&path, feature)?;
        Ok(path)
    }

    pub fn load_feature(&self, name: &str) -> Result<Feature> {
        let path = self.feature_path(name);
        read_document(&path)?.ok_or_else(|| Error::not_found("feature", name))
    }

    pub fn save_plan(&self, plan: &TransplantPlan) -> Result<PathBuf> {
        let path = self.plan_path(&plan.feature_name, &plan.target_project);
        write_document(&path, plan)?;
        Ok(path)
    }

    pub fn load_plan(&self, feature: &str, target: &str) -> Result<TransplantPlan> {
        let path = self.plan_path(feature, target);
        read_document(&path)?
            .ok_or_else(|| Error::not_found("plan", format!("{feature} -> {target}")))
    }

    // ── Legacy migration ────────────────────────────────────

    pub fn has_legacy_knowledge(&self) -> Result<bool> {
        Ok(read_document::<serde_json::Value>(&self.graph_path())?
            .is_some_and(|raw| raw.get(LEGACY_KNOWLEDGE_KEY).is_some()))
    }

    /// Move learnings embedded in the graph document into the knowledge
    /// document. The knowledge document is written before the graph is
    /// rewritten without the legacy key; modules and edges are untouched.
    pub fn migrate_legacy_knowledge(&self) -> Result<MigrationReport> {
        let graph_path = self.graph_path();
        let Some(mut raw) = read_document::<serde_json::Value>(&graph_path)? else {
            return Ok(MigrationReport::default());
        };
        let Some(object) = raw.as_object_mut() else {
            return Err(Error::Parse {
                path: graph_path,
                reason: "graph document is not an object".into(),
            });
        };
        let Some(legacy) = object.remove(LEGACY_KNOWLEDGE_KEY) else {
            return Ok(MigrationReport::default());
        };

        let project = object
            .get("project")
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string();
        let learnings = legacy_learnings(legacy).map_err(|reason| Error::Parse {
            path: graph_path.clone(),
            reason,
        })?;

        let mut report = MigrationReport {
            found: learnings.len(),
            ..Default::default()
        };
        let mut store = self.load_knowledge(&project)?;
        for learning in learnings {
            if store.adopt_learning(learning) {
                report.migrated += 1;
            } else {
                report.kept_existing += 1;
            }
        }
        store.record_run(
            RunKind::Migrate,
            format!(
                "migrated {} of {} embedded learnings",
                report.migrated, report.found
            ),
        );
        self.save_knowledge(&mut store)?;
        write_document(&graph_path, &raw)?;

        tracing::info!(
            "Migrated {} legacy learnings out of {}",
            report.migrated,
            graph_path.display()
        );
        Ok(report)
    }

    /// Remove the whole data directory.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

/// Accept the two shapes older graph documents used: a map keyed by module
/// path, or a list of learnings carrying their own `module_path`.
fn legacy_learnings(legacy: serde_json::Value) -> std::result::Result<Vec<Learning>, String> {
    let entries: Vec<(Option<String>, serde_json::Value)> = match legacy {
        serde_json::Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        serde_json::Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        serde_json::Value::Null => Vec::new(),
        other => return Err(format!("unexpected legacy knowledge value: {other}")),
    };

    let mut learnings = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let mut learning: Learning = serde_json::from_value(value)
            .map_err(|e| format!("legacy learning {}: {e}", key.as_deref().unwrap_or("?")))?;
        if learning.module_path.is_empty() {
            match key {
                Some(key) => learning.module_path = key,
                None => return Err("legacy learning without module_path".into()),
            }
        }
        learnings.push(learning);
    }
    Ok(learnings)
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a JSON document; `None` if the file does not exist.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' { c } else { '-' })
        .collect();
    if slug.is_empty() { "unnamed".into() } else { slug }
}
