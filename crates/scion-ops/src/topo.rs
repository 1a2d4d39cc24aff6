//! Dependency-first ordering of a module subset

use scion_core::{DependencyView, OrderStatus};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoOrder {
    pub order: Vec<String>,
    pub status: OrderStatus,
}

/// Kahn's algorithm over `subset`, considering only edges inside it.
/// Dependencies come before their dependents. Nodes left over by a cycle
/// are appended in discovery order and reported in the status.
pub fn topological_order(subset: &[String], view: &DependencyView) -> TopoOrder {
    let members: HashSet<&str> = subset.iter().map(String::as_str).collect();

    let mut pending: HashMap<&str, usize> = HashMap::with_capacity(subset.len());
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in subset {
        let deps: Vec<&str> = view
            .dependencies(node)
            .into_iter()
            .filter(|d| members.contains(d) && *d != node.as_str())
            .collect();
        pending.insert(node.as_str(), deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(node.as_str());
        }
    }

    let mut queue: VecDeque<&str> = subset
        .iter()
        .map(String::as_str)
        .filter(|n| pending.get(n) == Some(&0))
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(subset.len());
    let mut placed: HashSet<&str> = HashSet::with_capacity(subset.len());

    while let Some(node) = queue.pop_front() {
        if !placed.insert(node) {
            continue;
        }
        order.push(node.to_string());
        for &dependent in dependents.get(node).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    let appended: Vec<String> = subset
        .iter()
        .filter(|n| !placed.contains(n.as_str()))
        .cloned()
        .collect();
    if appended.is_empty() {
        return TopoOrder {
            order,
            status: OrderStatus::Complete,
        };
    }
    tracing::warn!("Dependency cycle among {} modules; appended in discovery order", appended.len());
    order.extend(appended.iter().cloned());
    TopoOrder {
        order,
        status: OrderStatus::Degraded { appended },
    }
}
