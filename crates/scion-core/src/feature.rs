//! Exported feature bundles and transplant plans

use crate::code_ref::CodeRef;
use crate::model::{Interface, InterfaceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether component order is a true topological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderStatus {
    Complete,
    /// A cycle remained; these components were appended in discovery order.
    Degraded { appended: Vec<String> },
}

impl OrderStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, OrderStatus::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub package: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidedInterface {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    pub signature: String,
}

impl From<&Interface> for ProvidedInterface {
    fn from(interface: &Interface) -> Self {
        ProvidedInterface {
            name: interface.name.clone(),
            kind: interface.kind,
            signature: interface.signature.clone(),
        }
    }
}

/// A dependency-closed, ordered bundle of modules meant to move together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub source_project: String,
    pub extracted_at: DateTime<Utc>,
    /// The module the feature was extracted around.
    pub primary: String,
    /// Dependencies precede dependents unless `ordering` is degraded.
    pub components: Vec<String>,
    pub ordering: OrderStatus,
    pub requires: Vec<Requirement>,
    pub provides: Vec<ProvidedInterface>,
    pub code_refs: BTreeMap<String, CodeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<BTreeMap<String, String>>,
}

impl Feature {
    pub fn contains(&self, path: &str) -> bool {
        self.components.iter().any(|c| c == path)
    }

    /// Position of a component in generation order.
    pub fn position(&self, path: &str) -> Option<usize> {
        self.components.iter().position(|c| c == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingAction {
    /// The target already has a matching interface to adapt.
    Adapt,
    /// Nothing matches; a new module is suggested.
    Create,
    /// Not carried over.
    Skip,
}

impl fmt::Display for MappingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingAction::Adapt => "ADAPT",
            MappingAction::Create => "CREATE",
            MappingAction::Skip => "SKIP",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub source_interface: String,
    pub source_module: String,
    pub target_interface: Option<String>,
    /// The matched module for ADAPT, a suggested path for CREATE.
    pub target_module: Option<String>,
    pub action: MappingAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiringAction {
    AddDependency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringTask {
    pub file: String,
    pub action: WiringAction,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransplantPlan {
    pub feature_name: String,
    pub source_project: String,
    pub target_project: String,
    pub mappings: Vec<Mapping>,
    pub wiring: Vec<WiringTask>,
    pub generation_order: Vec<String>,
    pub ordering: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_serialization() {
        let degraded = OrderStatus::Degraded {
            appended: vec!["a.py".into()],
        };
        insta::assert_snapshot!(
            serde_json::to_string(&degraded).unwrap(),
            @r#"{"status":"degraded","appended":["a.py"]}"#
        );
        insta::assert_snapshot!(
            serde_json::to_string(&OrderStatus::Complete).unwrap(),
            @r#"{"status":"complete"}"#
        );
    }

    #[test]
    fn test_mapping_action_wire_names() {
        assert_eq!(serde_json::to_string(&MappingAction::Adapt).unwrap(), "\"ADAPT\"");
        assert_eq!(MappingAction::Create.to_string(), "CREATE");
    }

    #[test]
    fn test_provided_interface_uses_type_key() {
        let provided = ProvidedInterface {
            name: "Tokenizer".into(),
            kind: InterfaceKind::Class,
            signature: "class Tokenizer".into(),
        };
        let json = serde_json::to_value(&provided).unwrap();
        assert_eq!(json["type"], "class");
    }
}
