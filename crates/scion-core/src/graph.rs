//! The persisted dependency graph and a petgraph view over its internal edges

use crate::model::*;
use chrono::{DateTime, Utc};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Schema version written into every graph document.
pub const GRAPH_VERSION: u32 = 1;

/// Whole-project dependency graph. Rebuilt from scratch on every index run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub project: String,
    pub version: u32,
    pub indexed_at: DateTime<Utc>,
    pub modules: BTreeMap<String, Module>,
    pub edges: Vec<Edge>,
}

/// One interface together with the module that owns it.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceLocation<'a> {
    pub module: &'a str,
    pub interface: &'a Interface,
}

/// A broken graph invariant reported by [`Graph::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// An internal dependency with no matching edge.
    MissingEdge { module: String, target: String },
    /// An internal dependency naming a path that is not a module.
    UnknownDependency { module: String, target: String },
    /// An edge whose source is not a module.
    UnknownSource { source: String },
}

impl Graph {
    pub fn new(project: impl Into<String>) -> Self {
        Graph {
            project: project.into(),
            version: GRAPH_VERSION,
            indexed_at: Utc::now(),
            modules: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Insert a module, replacing any previous module with the same path.
    pub fn insert_module(&mut self, module: Module) -> Option<Module> {
        self.modules.insert(module.path.clone(), module)
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn module(&self, path: &str) -> Option<&Module> {
        self.modules.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// An edge target is internal exactly when it names a module.
    pub fn is_internal(&self, target: &str) -> bool {
        self.modules.contains_key(target)
    }

    pub fn internal_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| self.is_internal(&e.target))
    }

    pub fn external_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| !self.is_internal(&e.target))
    }

    /// Outgoing edges of a module.
    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == source)
    }

    /// Incoming edges of a module.
    pub fn edges_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == target)
    }

    /// Every external package used anywhere in the project.
    pub fn external_packages(&self) -> BTreeSet<&str> {
        self.modules
            .values()
            .flat_map(|m| m.external_deps.iter().map(String::as_str))
            .collect()
    }

    /// All interfaces of all modules, keyed by lowercased name, in module order.
    pub fn interface_index(&self) -> BTreeMap<String, Vec<InterfaceLocation<'_>>> {
        let mut index: BTreeMap<String, Vec<InterfaceLocation<'_>>> = BTreeMap::new();
        for module in self.modules.values() {
            for interface in &module.interfaces {
                index
                    .entry(interface.name.to_lowercase())
                    .or_default()
                    .push(InterfaceLocation {
                        module: &module.path,
                        interface,
                    });
            }
        }
        index
    }

    /// Most common module language, ties broken by `Language` order.
    pub fn dominant_language(&self) -> Option<Language> {
        let mut counts: BTreeMap<Language, usize> = BTreeMap::new();
        for module in self.modules.values() {
            *counts.entry(module.language).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .fold(None, |best: Option<(Language, usize)>, (lang, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((lang, n)),
            })
            .map(|(lang, _)| lang)
    }

    /// Verify that internal dependencies and edges agree.
    pub fn check_invariants(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for module in self.modules.values() {
            for dep in &module.internal_deps {
                if !self.is_internal(dep) {
                    violations.push(Violation::UnknownDependency {
                        module: module.path.clone(),
                        target: dep.clone(),
                    });
                } else if !self.edges_from(&module.path).any(|e| &e.target == dep) {
                    violations.push(Violation::MissingEdge {
                        module: module.path.clone(),
                        target: dep.clone(),
                    });
                }
            }
        }
        for edge in &self.edges {
            if !self.is_internal(&edge.source) {
                violations.push(Violation::UnknownSource {
                    source: edge.source.clone(),
                });
            }
        }
        violations
    }

    /// Equal modules and edges, ignoring `indexed_at`.
    pub fn same_structure(&self, other: &Graph) -> bool {
        self.project == other.project && self.modules == other.modules && self.edges == other.edges
    }

    /// Build a petgraph view of internal module-to-module dependencies.
    pub fn dependency_view(&self) -> DependencyView {
        let mut inner = StableDiGraph::new();
        let mut index = HashMap::with_capacity(self.modules.len());
        for path in self.modules.keys() {
            index.insert(path.clone(), inner.add_node(path.clone()));
        }
        for edge in self.internal_edges() {
            if let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target)) {
                if from != to {
                    inner.update_edge(from, to, ());
                }
            }
        }
        DependencyView { inner, index }
    }
}

/// Directed "depends on" graph between modules. An edge A -> B means A imports B.
pub struct DependencyView {
    inner: StableDiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for DependencyView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyView")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl DependencyView {
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Modules that `path` imports, sorted.
    pub fn dependencies(&self, path: &str) -> Vec<&str> {
        self.neighbors(path, Direction::Outgoing)
    }

    /// Modules that import `path`, sorted.
    pub fn dependents(&self, path: &str) -> Vec<&str> {
        self.neighbors(path, Direction::Incoming)
    }

    fn neighbors(&self, path: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(path) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .inner
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.inner.node_weight(n).map(String::as_str))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, deps: &[&str]) -> Module {
        let mut m = Module::new(path, Language::Python);
        m.internal_deps = deps.iter().map(|d| d.to_string()).collect();
        m
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Import,
            specifics: vec![],
        }
    }

    #[test]
    fn test_invariants_detect_missing_edge() {
        let mut graph = Graph::new("demo");
        graph.insert_module(module("a.py", &[]));
        graph.insert_module(module("b.py", &["a.py"]));
        assert_eq!(
            graph.check_invariants(),
            vec![Violation::MissingEdge {
                module: "b.py".into(),
                target: "a.py".into()
            }]
        );

        graph.add_edge(edge("b.py", "a.py"));
        assert!(graph.check_invariants().is_empty());
    }

    #[test]
    fn test_external_edges_are_not_internal() {
        let mut graph = Graph::new("demo");
        graph.insert_module(module("a.py", &[]));
        graph.add_edge(edge("a.py", "requests"));
        assert_eq!(graph.internal_edges().count(), 0);
        assert_eq!(graph.external_edges().count(), 1);
    }

    #[test]
    fn test_dependency_view_dedupes_parallel_edges() {
        let mut graph = Graph::new("demo");
        graph.insert_module(module("a.py", &[]));
        graph.insert_module(module("b.py", &["a.py"]));
        graph.add_edge(Edge {
            specifics: vec!["x".into()],
            ..edge("b.py", "a.py")
        });
        graph.add_edge(Edge {
            specifics: vec!["y".into()],
            ..edge("b.py", "a.py")
        });

        let view = graph.dependency_view();
        assert_eq!(view.edge_count(), 1);
        assert_eq!(view.dependents("a.py"), vec!["b.py"]);
        assert_eq!(view.dependencies("b.py"), vec!["a.py"]);
        assert!(view.dependents("missing.py").is_empty());
    }

    #[test]
    fn test_dominant_language() {
        let mut graph = Graph::new("demo");
        assert_eq!(graph.dominant_language(), None);
        graph.insert_module(Module::new("a.rs", Language::Rust));
        graph.insert_module(Module::new("b.py", Language::Python));
        graph.insert_module(Module::new("c.py", Language::Python));
        assert_eq!(graph.dominant_language(), Some(Language::Python));
    }
}
