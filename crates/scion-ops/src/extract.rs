//! Package a module and its dependency closure as a feature

use crate::search::{SearchContext, search_code};
use crate::topo::topological_order;
use chrono::Utc;
use scion_core::{CodeRef, Error, Feature, Graph, ProvidedInterface, Requirement, Result};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Feature name; the primary module's stem when absent.
    pub name: Option<String>,
    /// Embed the full text of every component.
    pub snapshots: bool,
}

impl ExtractOptions {
    pub fn named(name: impl Into<String>) -> Self {
        ExtractOptions {
            name: Some(name.into()),
            snapshots: false,
        }
    }

    pub fn with_snapshots(mut self, snapshots: bool) -> Self {
        self.snapshots = snapshots;
        self
    }
}

/// Extract around the best code search hit for `query`, ranked the way
/// `context` ranks a code search.
pub fn extract_feature(
    graph: &Graph,
    root: &Path,
    query: &str,
    options: &ExtractOptions,
    context: &SearchContext,
) -> Result<Feature> {
    let hits = search_code(graph, query, 1, context);
    let primary = hits
        .first()
        .map(|hit| hit.item.path.clone())
        .ok_or_else(|| Error::not_found("module matching", query))?;
    tracing::debug!("Query {:?} selected {}", query, primary);
    extract_feature_from(graph, root, &primary, options)
}

/// Extract around a known module.
pub fn extract_feature_from(graph: &Graph, root: &Path, primary: &str, options: &ExtractOptions) -> Result<Feature> {
    let module = graph
        .module(primary)
        .ok_or_else(|| Error::not_found("module", primary))?;
    let view = graph.dependency_view();

    // Breadth-first closure over internal dependencies, in discovery order.
    let mut discovered = vec![primary.to_string()];
    let mut seen: HashSet<String> = HashSet::from([primary.to_string()]);
    let mut queue = VecDeque::from([primary.to_string()]);
    while let Some(current) = queue.pop_front() {
        for dep in view.dependencies(&current) {
            if seen.insert(dep.to_string()) {
                discovered.push(dep.to_string());
                queue.push_back(dep.to_string());
            }
        }
    }

    let topo = topological_order(&discovered, &view);

    let mut requires: Vec<Requirement> = Vec::new();
    for component in &topo.order {
        let Some(m) = graph.module(component) else {
            continue;
        };
        for package in &m.external_deps {
            if !requires.iter().any(|r| &r.package == package) {
                requires.push(Requirement {
                    package: package.clone(),
                });
            }
        }
    }

    let mut code_refs = BTreeMap::new();
    for component in &topo.order {
        code_refs.insert(component.clone(), CodeRef::capture(root, component)?);
    }

    let snapshots = if options.snapshots {
        let mut texts = BTreeMap::new();
        for (path, code_ref) in &code_refs {
            texts.insert(path.clone(), code_ref.load(root)?);
        }
        Some(texts)
    } else {
        None
    };

    let name = options
        .name
        .clone()
        .unwrap_or_else(|| module.stem().to_string());
    tracing::info!(
        "Extracted feature {} from {}: {} components, {} requirements",
        name,
        primary,
        topo.order.len(),
        requires.len()
    );

    Ok(Feature {
        name,
        source_project: graph.project.clone(),
        extracted_at: Utc::now(),
        primary: primary.to_string(),
        components: topo.order,
        ordering: topo.status,
        requires,
        provides: module.interfaces.iter().map(ProvidedInterface::from).collect(),
        code_refs,
        snapshots,
    })
}
