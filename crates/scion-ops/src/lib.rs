//! Queries over an indexed project: search, impact, extraction, transplant planning

pub mod extract;
pub mod impact;
pub mod search;
pub mod topo;
pub mod transplant;


pub use extract::{ExtractOptions, extract_feature, extract_feature_from};
pub use impact::{ImpactReport, Risk, analyze_impact};
pub use search::{Hit, SearchContext, Searchable, search, search_code, search_knowledge};
pub use topo::{TopoOrder, topological_order};
pub use transplant::plan_transplant;
