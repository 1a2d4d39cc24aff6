//! Blast radius of changing one module

use scion_core::{Error, Graph, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Risk {
    /// Low below 2 dependents, high above 5.
    pub fn from_dependents(total: usize) -> Self {
        match total {
            0..=1 => Risk::Low,
            2..=5 => Risk::Medium,
            _ => Risk::High,
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Risk::Low => "LOW",
            Risk::Medium => "MEDIUM",
            Risk::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub module: String,
    /// Modules importing `module` directly, sorted.
    pub direct: Vec<String>,
    /// Modules reaching `module` only through other dependents, sorted.
    pub indirect: Vec<String>,
    pub total: usize,
    pub risk: Risk,
}

/// Every module that depends on `module`, directly or transitively, found by
/// expanding a frontier over internal edges.
pub fn analyze_impact(graph: &Graph, module: &str) -> Result<ImpactReport> {
    if !graph.contains(module) {
        return Err(Error::not_found("module", module));
    }
    let view = graph.dependency_view();

    let direct: Vec<String> = view
        .dependents(module)
        .into_iter()
        .filter(|d| *d != module)
        .map(str::to_string)
        .collect();

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    visited.insert(module);
    visited.extend(direct.iter().map(String::as_str));

    let mut indirect = BTreeSet::new();
    let mut frontier: Vec<&str> = direct.iter().map(String::as_str).collect();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for current in frontier {
            for dependent in view.dependents(current) {
                if visited.insert(dependent) {
                    indirect.insert(dependent.to_string());
                    next.push(dependent);
                }
            }
        }
        frontier = next;
    }

    let total = direct.len() + indirect.len();
    let report = ImpactReport {
        module: module.to_string(),
        direct,
        indirect: indirect.into_iter().collect(),
        total,
        risk: Risk::from_dependents(total),
    };
    tracing::debug!("Impact of {}: {} dependents ({})", module, report.total, report.risk);
    Ok(report)
}
