//! Durable per-project knowledge: learnings, decisions, patterns, run history
//!
//! Knowledge is keyed by the same module paths as the graph but lives in its
//! own document, so reindexing never touches it.

use crate::code_ref::CodeRef;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

/// Schema version written into every knowledge document.
pub const KNOWLEDGE_VERSION: u32 = 1;

/// Default bound on the run history window.
pub const DEFAULT_RUN_HISTORY: usize = 50;

/// A semantic note about one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Learning {
    pub module_path: String,
    pub summary: String,
    pub purpose: String,
    /// Function name -> what it does.
    pub key_functions: BTreeMap<String, String>,
    /// Parameter name -> meaning.
    pub key_parameters: BTreeMap<String, String>,
    pub gotchas: Vec<String>,
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transplant_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<CodeRef>,
    /// Clamped to [0, 1].
    pub confidence: f32,
    pub version: u32,
    pub learned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Learning {
    fn default() -> Self {
        let now = Utc::now();
        Learning {
            module_path: String::new(),
            summary: String::new(),
            purpose: String::new(),
            key_functions: BTreeMap::new(),
            key_parameters: BTreeMap::new(),
            gotchas: Vec::new(),
            dependencies: Vec::new(),
            transplant_target: None,
            source_ref: None,
            confidence: 1.0,
            version: 1,
            learned_at: now,
            updated_at: now,
        }
    }
}

impl Learning {
    pub fn new(module_path: impl Into<String>, summary: impl Into<String>) -> Self {
        Learning {
            module_path: module_path.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn with_key_function(mut self, name: impl Into<String>, what: impl Into<String>) -> Self {
        self.key_functions.insert(name.into(), what.into());
        self
    }

    pub fn with_gotcha(mut self, gotcha: impl Into<String>) -> Self {
        self.gotchas.push(gotcha.into());
        self
    }

    pub fn with_source_ref(mut self, source_ref: CodeRef) -> Self {
        self.source_ref = Some(source_ref);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// A learning without a source reference can never go stale.
    pub fn is_stale(&self, root: &Path) -> bool {
        self.source_ref
            .as_ref()
            .is_some_and(|code_ref| code_ref.is_stale(root))
    }

    fn normalize(&mut self) {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub rationale: String,
    pub modules: Vec<String>,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Index,
    Migrate,
    Learn,
    Refresh,
    Extract,
    Plan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub kind: RunKind,
    pub at: DateTime<Utc>,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { version: u32 },
    /// Nothing changed on disk; the learning was left untouched.
    AlreadyFresh,
}

/// Learnings split by current disk state.
#[derive(Debug, Default)]
pub struct StalenessReport<'a> {
    pub stale: Vec<&'a Learning>,
    pub fresh: Vec<&'a Learning>,
}

/// The knowledge document of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStore {
    pub project: String,
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    learnings: BTreeMap<String, Learning>,
    #[serde(default)]
    decisions: Vec<Decision>,
    #[serde(default)]
    patterns: BTreeMap<String, String>,
    #[serde(default)]
    runs: VecDeque<RunRecord>,
    #[serde(skip, default = "default_run_limit")]
    run_limit: usize,
}

fn default_run_limit() -> usize {
    DEFAULT_RUN_HISTORY
}

impl KnowledgeStore {
    pub fn new(project: impl Into<String>) -> Self {
        KnowledgeStore {
            project: project.into(),
            version: KNOWLEDGE_VERSION,
            saved_at: Utc::now(),
            learnings: BTreeMap::new(),
            decisions: Vec::new(),
            patterns: BTreeMap::new(),
            runs: VecDeque::new(),
            run_limit: DEFAULT_RUN_HISTORY,
        }
    }

    /// Bound the run history, trimming the oldest records if needed.
    pub fn set_run_limit(&mut self, limit: usize) {
        self.run_limit = limit.max(1);
        self.trim_runs();
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved_at = Utc::now();
    }

    // ── Learnings ───────────────────────────────────────────

    /// Record a new learning. Fails if the module already has one; use
    /// [`relearn`](Self::relearn) to replace it.
    pub fn add_learning(&mut self, mut learning: Learning) -> Result<()> {
        if self.learnings.contains_key(&learning.module_path) {
            return Err(Error::already_exists("learning", learning.module_path));
        }
        let now = Utc::now();
        learning.normalize();
        learning.version = 1;
        learning.learned_at = now;
        learning.updated_at = now;
        tracing::debug!("Learned {}", learning.module_path);
        self.learnings.insert(learning.module_path.clone(), learning);
        Ok(())
    }

    /// Replace an existing learning wholesale. Returns the new version.
    pub fn relearn(&mut self, mut learning: Learning) -> Result<u32> {
        let previous = self
            .learnings
            .get(&learning.module_path)
            .ok_or_else(|| Error::not_found("learning", learning.module_path.clone()))?;
        learning.normalize();
        learning.version = previous.version + 1;
        learning.learned_at = previous.learned_at;
        learning.updated_at = Utc::now();
        let version = learning.version;
        self.learnings.insert(learning.module_path.clone(), learning);
        Ok(version)
    }

    /// Re-capture the source reference of a stale learning.
    pub fn refresh(&mut self, module_path: &str, root: &Path) -> Result<RefreshOutcome> {
        let learning = self
            .learnings
            .get_mut(module_path)
            .ok_or_else(|| Error::not_found("learning", module_path))?;
        let Some(code_ref) = learning.source_ref.as_ref() else {
            return Ok(RefreshOutcome::AlreadyFresh);
        };
        if !code_ref.is_stale(root) {
            return Ok(RefreshOutcome::AlreadyFresh);
        }
        let refreshed = code_ref.refreshed(root)?;
        learning.source_ref = Some(refreshed);
        learning.version += 1;
        learning.updated_at = Utc::now();
        Ok(RefreshOutcome::Refreshed {
            version: learning.version,
        })
    }

    pub fn learning(&self, module_path: &str) -> Option<&Learning> {
        self.learnings.get(module_path)
    }

    pub fn remove_learning(&mut self, module_path: &str) -> Option<Learning> {
        self.learnings.remove(module_path)
    }

    /// Learnings in module-path order.
    pub fn learnings(&self) -> impl Iterator<Item = &Learning> {
        self.learnings.values()
    }

    pub fn learning_count(&self) -> usize {
        self.learnings.len()
    }

    /// Insert a learning carried over from an older document unless the
    /// module already has one. Returns whether it was inserted.
    pub fn adopt_learning(&mut self, mut learning: Learning) -> bool {
        if self.learnings.contains_key(&learning.module_path) {
            return false;
        }
        learning.normalize();
        self.learnings.insert(learning.module_path.clone(), learning);
        true
    }

    pub fn is_stale(&self, module_path: &str, root: &Path) -> Result<bool> {
        self.learning(module_path)
            .map(|l| l.is_stale(root))
            .ok_or_else(|| Error::not_found("learning", module_path))
    }

    /// Split every learning into stale and fresh in one pass over the disk.
    pub fn partition(&self, root: &Path) -> StalenessReport<'_> {
        let mut report = StalenessReport::default();
        for learning in self.learnings.values() {
            if learning.is_stale(root) {
                report.stale.push(learning);
            } else {
                report.fresh.push(learning);
            }
        }
        report
    }

    pub fn stale(&self, root: &Path) -> Vec<&Learning> {
        self.partition(root).stale
    }

    pub fn fresh(&self, root: &Path) -> Vec<&Learning> {
        self.partition(root).fresh
    }

    // ── Decisions ───────────────────────────────────────────

    pub fn record_decision(&mut self, rationale: impl Into<String>, modules: Vec<String>) {
        self.decisions.push(Decision {
            rationale: rationale.into(),
            modules,
            decided_at: Utc::now(),
        });
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn decisions_for<'a>(&'a self, module_path: &'a str) -> impl Iterator<Item = &'a Decision> {
        self.decisions
            .iter()
            .filter(move |d| d.modules.iter().any(|m| m == module_path))
    }

    // ── Patterns ────────────────────────────────────────────

    /// Add or replace a named pattern; returns the previous description.
    pub fn add_pattern(&mut self, name: impl Into<String>, description: impl Into<String>) -> Option<String> {
        self.patterns.insert(name.into(), description.into())
    }

    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.patterns.get(name).map(String::as_str)
    }

    pub fn patterns(&self) -> &BTreeMap<String, String> {
        &self.patterns
    }

    // ── Runs ────────────────────────────────────────────────

    pub fn record_run(&mut self, kind: RunKind, detail: impl Into<String>) {
        self.runs.push_back(RunRecord {
            kind,
            at: Utc::now(),
            detail: detail.into(),
        });
        self.trim_runs();
    }

    /// Oldest first.
    pub fn runs(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter()
    }

    fn trim_runs(&mut self) {
        while self.runs.len() > self.run_limit {
            self.runs.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{code_ref, create_repo_with_structure, edit_file};
    use std::fs;

    #[test]
    fn test_add_rejects_duplicates() {
        let mut store = KnowledgeStore::new("demo");
        store.add_learning(Learning::new("a.py", "first")).unwrap();
        let err = store.add_learning(Learning::new("a.py", "again")).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(store.learning("a.py").unwrap().summary, "first");
    }

    #[test]
    fn test_relearn_replaces_and_bumps_version() {
        let mut store = KnowledgeStore::new("demo");
        store
            .add_learning(Learning::new("a.py", "first").with_gotcha("slow"))
            .unwrap();
        let version = store.relearn(Learning::new("a.py", "second")).unwrap();

        let learning = store.learning("a.py").unwrap();
        assert_eq!(version, 2);
        assert_eq!(learning.summary, "second");
        assert!(learning.gotchas.is_empty());
        assert!(store.relearn(Learning::new("b.py", "x")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut store = KnowledgeStore::new("demo");
        store
            .add_learning(Learning::new("a.py", "x").with_confidence(3.0))
            .unwrap();
        assert_eq!(store.learning("a.py").unwrap().confidence, 1.0);
    }

    #[test]
    fn test_staleness_round_trip() {
        let dir = create_repo_with_structure(&[("a.py", "x = 1\n")]);

        let mut store = KnowledgeStore::new("demo");
        store
            .add_learning(Learning::new("a.py", "x").with_source_ref(code_ref(dir.path(), "a.py")))
            .unwrap();
        assert!(!store.is_stale("a.py", dir.path()).unwrap());
        assert_eq!(
            store.refresh("a.py", dir.path()).unwrap(),
            RefreshOutcome::AlreadyFresh
        );
        assert_eq!(store.learning("a.py").unwrap().version, 1);

        edit_file(dir.path(), "a.py", "x = 2\n");
        assert!(store.is_stale("a.py", dir.path()).unwrap());

        assert_eq!(
            store.refresh("a.py", dir.path()).unwrap(),
            RefreshOutcome::Refreshed { version: 2 }
        );
        assert!(!store.is_stale("a.py", dir.path()).unwrap());
    }

    #[test]
    fn test_partition_splits_stale_and_fresh() {
        let dir = create_repo_with_structure(&[("a.py", "a\n"), ("b.py", "b\n")]);

        let mut store = KnowledgeStore::new("demo");
        for path in ["a.py", "b.py"] {
            store
                .add_learning(Learning::new(path, path).with_source_ref(code_ref(dir.path(), path)))
                .unwrap();
        }
        store.add_learning(Learning::new("c.py", "no ref")).unwrap();
        fs::remove_file(dir.path().join("b.py")).unwrap();

        let report = store.partition(dir.path());
        let stale: Vec<_> = report.stale.iter().map(|l| l.module_path.as_str()).collect();
        let fresh: Vec<_> = report.fresh.iter().map(|l| l.module_path.as_str()).collect();
        assert_eq!(stale, vec!["b.py"]);
        assert_eq!(fresh, vec!["a.py", "c.py"]);
    }

    #[test]
    fn test_run_history_is_bounded() {
        let mut store = KnowledgeStore::new("demo");
        store.set_run_limit(3);
        for i in 0..5 {
            store.record_run(RunKind::Index, format!("run {i}"));
        }
        let details: Vec<_> = store.runs().map(|r| r.detail.as_str()).collect();
        assert_eq!(details, vec!["run 2", "run 3", "run 4"]);
    }

    #[test]
    fn test_decisions_and_patterns() {
        let mut store = KnowledgeStore::new("demo");
        store.record_decision("split io", vec!["a.py".into(), "b.py".into()]);
        store.record_decision("cache", vec!["c.py".into()]);
        assert_eq!(store.decisions_for("b.py").count(), 1);
        assert_eq!(store.decisions().len(), 2);

        assert_eq!(store.add_pattern("retry", "exponential"), None);
        assert_eq!(
            store.add_pattern("retry", "jittered").as_deref(),
            Some("exponential")
        );
        assert_eq!(store.pattern("retry"), Some("jittered"));
    }
}
