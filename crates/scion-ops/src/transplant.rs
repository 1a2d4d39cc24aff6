//! Plan how a feature lands in another codebase
//!
//! Planning only matches names and lists work; it never decides the final
//! layout of the target.

use scion_core::{
    Feature, Graph, Language, Mapping, MappingAction, TransplantPlan, WiringAction, WiringTask,
    manifest_file,
};
use std::path::Path;

pub fn plan_transplant(feature: &Feature, target: &Graph, target_project: &str) -> TransplantPlan {
    let index = target.interface_index();
    let suggested = feature
        .primary
        .rsplit('/')
        .next()
        .unwrap_or(&feature.primary)
        .to_string();

    let mappings: Vec<Mapping> = feature
        .provides
        .iter()
        .map(|provided| {
            if provided.name.starts_with('_') {
                return Mapping {
                    source_interface: provided.name.clone(),
                    source_module: feature.primary.clone(),
                    target_interface: None,
                    target_module: None,
                    action: MappingAction::Skip,
                };
            }
            match index
                .get(&provided.name.to_lowercase())
                .and_then(|locations| locations.first())
            {
                Some(location) => Mapping {
                    source_interface: provided.name.clone(),
                    source_module: feature.primary.clone(),
                    target_interface: Some(location.interface.name.clone()),
                    target_module: Some(location.module.to_string()),
                    action: MappingAction::Adapt,
                },
                None => Mapping {
                    source_interface: provided.name.clone(),
                    source_module: feature.primary.clone(),
                    target_interface: None,
                    target_module: Some(suggested.clone()),
                    action: MappingAction::Create,
                },
            }
        })
        .collect();

    let language = target
        .dominant_language()
        .or_else(|| Language::from_path(Path::new(&feature.primary)));
    let manifest = language.map(manifest_file).unwrap_or("requirements.txt");
    let present = target.external_packages();
    let wiring: Vec<WiringTask> = feature
        .requires
        .iter()
        .filter(|r| !present.contains(r.package.as_str()))
        .map(|r| WiringTask {
            file: manifest.to_string(),
            action: WiringAction::AddDependency,
            detail: r.package.clone(),
        })
        .collect();

    tracing::info!(
        "Planned {} into {}: {} mappings, {} wiring tasks",
        feature.name,
        target_project,
        mappings.len(),
        wiring.len()
    );

    TransplantPlan {
        feature_name: feature.name.clone(),
        source_project: feature.source_project.clone(),
        target_project: target_project.to_string(),
        mappings,
        wiring,
        generation_order: feature.components.clone(),
        ordering: feature.ordering.clone(),
    }
}
