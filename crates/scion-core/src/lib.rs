//! Scion Core: dependency graph model, knowledge store, and persisted documents

pub mod code_ref;
pub mod config;
pub mod error;
pub mod feature;
pub mod graph;
pub mod knowledge;
pub mod model;
pub mod registry;
pub mod store;
pub mod workspace;


#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use code_ref::{CodeRef, Freshness, LineRange};
pub use config::ScionConfig;
pub use error::{Error, Result};
pub use feature::{
    Feature, Mapping, MappingAction, OrderStatus, ProvidedInterface, Requirement, TransplantPlan,
    WiringAction, WiringTask,
};
pub use graph::{DependencyView, Graph, InterfaceLocation, Violation};
pub use knowledge::{KnowledgeStore, Learning, RefreshOutcome, RunKind};
pub use model::{Edge, EdgeKind, Interface, InterfaceKind, Language, Module, module_path};
pub use registry::{ProjectEntry, ProjectLookup, ProjectRegistry};
pub use store::{DATA_DIR, MigrationReport, ProjectStore};
pub use workspace::{detect_language, manifest_file};
