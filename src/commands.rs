//! CLI command implementations

use anyhow::{Context, bail};
use scion_core::{
    CodeRef, KnowledgeStore, Language, Learning, ProjectLookup, ProjectRegistry, ProjectStore,
    RefreshOutcome, RunKind,
};
use scion_indexer::Indexer;
use scion_ops::{ExtractOptions, SearchContext};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

pub struct LearnArgs {
    pub module: String,
    pub summary: String,
    pub purpose: Option<String>,
    pub functions: Vec<String>,
    pub gotchas: Vec<String>,
    pub relearn: bool,
}

pub fn index(root: PathBuf, project: Option<String>, language: Option<Language>) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let project = project.unwrap_or_else(|| default_project_name(store.root()));
    tracing::info!("Indexing repository: {}", store.root().display());

    let report = Indexer::for_store(&store, project, language)
        .reindex(&store)
        .context("index run failed")?;

    if report.migrated.migrated > 0 {
        tracing::info!("Migrated {} legacy learnings", report.migrated.migrated);
    }
    for failure in &report.failures {
        println!("skipped {}: {}", failure.path, failure.error);
    }
    println!(
        "{} modules, {} edges written to {}",
        report.graph.module_count(),
        report.graph.edge_count(),
        store.graph_path().display()
    );
    Ok(())
}

pub fn find(root: PathBuf, query: &str, knowledge: bool, limit: usize) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let context = SearchContext::new(store.config().search.clone()).with_root(store.root());

    let hits: Vec<serde_json::Value> = if knowledge {
        let knowledge = store.load_knowledge(&project_name(&store)?)?;
        scion_ops::search_knowledge(&knowledge, query, limit, &context)
            .iter()
            .map(|hit| {
                json!({
                    "module_path": hit.item.module_path,
                    "summary": hit.item.summary,
                    "stale": hit.item.is_stale(store.root()),
                    "score": hit.score,
                })
            })
            .collect()
    } else {
        let graph = store.require_graph().context("run `scion index` first")?;
        scion_ops::search_code(&graph, query, limit, &context)
            .iter()
            .map(|hit| {
                json!({
                    "path": hit.item.path,
                    "summary": hit.item.summary,
                    "score": hit.score,
                })
            })
            .collect()
    };

    if hits.is_empty() {
        tracing::info!("No matches for {:?}", query);
    }
    print_json(&hits)
}

pub fn impact(root: PathBuf, module: &str) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let graph = store.require_graph().context("run `scion index` first")?;
    let report = scion_ops::analyze_impact(&graph, module)?;
    print_json(&report)
}

pub fn extract(
    root: PathBuf,
    query: Option<String>,
    from: Option<String>,
    name: Option<String>,
    snapshots: bool,
) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let graph = store.require_graph().context("run `scion index` first")?;
    let options = ExtractOptions {
        name,
        snapshots,
    };

    let feature = match (from, query) {
        (Some(primary), _) => scion_ops::extract_feature_from(&graph, store.root(), &primary, &options)?,
        (None, Some(query)) => {
            let context = SearchContext::new(store.config().search.clone()).with_root(store.root());
            scion_ops::extract_feature(&graph, store.root(), &query, &options, &context)?
        }
        (None, None) => bail!("give a search query or --from <module>"),
    };
    if !feature.ordering.is_complete() {
        tracing::warn!("{} has a dependency cycle; generation order is approximate", feature.name);
    }

    let path = store.save_feature(&feature)?;
    record_run(
        &store,
        RunKind::Extract,
        format!("{} ({} components)", feature.name, feature.components.len()),
    )?;
    println!("{}", path.display());
    Ok(())
}

pub fn plan(root: PathBuf, registry: Option<PathBuf>, feature: &str, target: &str) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let feature = store
        .load_feature(feature)
        .with_context(|| format!("run `scion extract --name {feature}` first"))?;

    let Some(registry_path) = registry else {
        bail!("--registry is required to look up project {target:?}");
    };
    let registry = ProjectRegistry::load(&registry_path)
        .with_context(|| format!("failed to read registry {}", registry_path.display()))?;
    let target_root = registry.root(target)?;
    let target_graph = open_store(target_root)?
        .require_graph()
        .with_context(|| format!("project {target} has not been indexed"))?;

    let plan = scion_ops::plan_transplant(&feature, &target_graph, target);
    let path = store.save_plan(&plan)?;
    record_run(
        &store,
        RunKind::Plan,
        format!("{} -> {} ({} mappings)", plan.feature_name, target, plan.mappings.len()),
    )?;
    println!("{}", path.display());
    Ok(())
}

pub fn learn(root: PathBuf, args: LearnArgs) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let mut knowledge = load_knowledge(&store)?;

    let source_ref = CodeRef::capture(store.root(), &args.module)
        .with_context(|| format!("cannot learn {}", args.module))?;
    let mut learning = Learning::new(&args.module, args.summary).with_source_ref(source_ref);
    if let Some(purpose) = args.purpose {
        learning = learning.with_purpose(purpose);
    }
    for function in &args.functions {
        let (name, what) = function.split_once('=').unwrap_or((function.as_str(), ""));
        learning = learning.with_key_function(name.trim(), what.trim());
    }
    for gotcha in args.gotchas {
        learning = learning.with_gotcha(gotcha);
    }

    let version = if args.relearn {
        knowledge.relearn(learning)?
    } else {
        knowledge.add_learning(learning)?;
        1
    };
    knowledge.record_run(RunKind::Learn, format!("{} v{}", args.module, version));
    store.save_knowledge(&mut knowledge)?;
    println!("{} v{}", args.module, version);
    Ok(())
}

pub fn refresh(root: PathBuf, module: &str) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let mut knowledge = load_knowledge(&store)?;

    match knowledge.refresh(module, store.root())? {
        RefreshOutcome::Refreshed { version } => {
            knowledge.record_run(RunKind::Refresh, format!("{module} v{version}"));
            store.save_knowledge(&mut knowledge)?;
            println!("{module} refreshed to v{version}");
        }
        RefreshOutcome::AlreadyFresh => println!("{module} is up to date"),
    }
    Ok(())
}

pub fn stale(root: PathBuf) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let knowledge = load_knowledge(&store)?;
    let stale: Vec<&str> = knowledge
        .stale(store.root())
        .into_iter()
        .map(|learning| learning.module_path.as_str())
        .collect();
    print_json(&stale)
}

pub fn migrate(root: PathBuf) -> anyhow::Result<()> {
    let store = open_store(&root)?;
    let report = store.migrate_legacy_knowledge()?;
    if report.found == 0 {
        tracing::info!("No legacy knowledge in {}", store.graph_path().display());
    }
    print_json(&report)
}

pub fn clear(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("Clearing data for: {}", root.display());
    let store = open_store(&root)?;
    store.clear()?;
    tracing::info!("Data cleared");
    Ok(())
}

fn open_store(root: &Path) -> anyhow::Result<ProjectStore> {
    ProjectStore::open(root).with_context(|| format!("failed to open project at {}", root.display()))
}

/// The indexed project name, falling back to the root directory name.
fn project_name(store: &ProjectStore) -> anyhow::Result<String> {
    Ok(store
        .load_graph()?
        .map(|graph| graph.project)
        .unwrap_or_else(|| default_project_name(store.root())))
}

fn default_project_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

fn load_knowledge(store: &ProjectStore) -> anyhow::Result<KnowledgeStore> {
    let project = project_name(store)?;
    store
        .load_knowledge(&project)
        .with_context(|| format!("failed to read knowledge for {project}"))
}

fn record_run(store: &ProjectStore, kind: RunKind, detail: String) -> anyhow::Result<()> {
    let mut knowledge = load_knowledge(store)?;
    knowledge.record_run(kind, detail);
    store.save_knowledge(&mut knowledge)?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
