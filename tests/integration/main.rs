//! Integration tests for Scion
//!
//! These tests run whole workflows over repositories on disk: index, learn,
//! re-index, extract, and plan against a second project.

use scion_core::test_utils::{code_ref, create_python_repo, create_repo_with_structure, edit_file, write_file};
use scion_core::{
    Learning, MappingAction, ProjectLookup, ProjectRegistry, ProjectStore, RefreshOutcome, RunKind,
    WiringAction,
};
use scion_indexer::Indexer;
use scion_ops::{ExtractOptions, Risk, SearchContext};
use std::path::Path;
use std::process::Command;

fn index(root: &Path, project: &str) -> ProjectStore {
    let store = ProjectStore::open(root).unwrap();
    Indexer::for_store(&store, project, None).reindex(&store).unwrap();
    store
}

fn scion(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_scion"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to execute scion")
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = Command::new(env!("CARGO_BIN_EXE_scion"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("scion"));
    assert!(stdout.contains("Index codebases"));
}

/// Index through the binary, then ask it for an impact report.
#[test]
fn test_cli_index_then_impact() {
    let repo = create_python_repo();

    let output = scion(repo.path(), &["index"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(repo.path().join(".scion/graph.json").exists());

    let output = scion(repo.path(), &["impact", "pkg/util.py"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["direct"], serde_json::json!(["pkg/service.py"]));
    assert_eq!(report["indirect"], serde_json::json!(["pkg/app.py"]));
    assert_eq!(report["risk"], "MEDIUM");

    let output = scion(repo.path(), &["impact", "pkg/nowhere.py"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_requires_an_index() {
    let repo = create_python_repo();
    let output = scion(repo.path(), &["find", "tokenizer"]);
    assert!(!output.status.success());
}

/// Knowledge survives re-indexing and goes stale when its file changes.
#[test]
fn test_learn_reindex_and_refresh() {
    let repo = create_python_repo();
    let store = index(repo.path(), "demo");

    let mut knowledge = store.load_knowledge("demo").unwrap();
    knowledge
        .add_learning(
            Learning::new("pkg/util.py", "Slug helpers")
                .with_purpose("build url names")
                .with_source_ref(code_ref(repo.path(), "pkg/util.py")),
        )
        .unwrap();
    store.save_knowledge(&mut knowledge).unwrap();

    write_file(repo.path(), "pkg/extra.py", "from pkg.util import slugify\n");
    let report = Indexer::for_store(&store, "demo", None).reindex(&store).unwrap();
    assert!(report.graph.contains("pkg/extra.py"));
    assert_eq!(
        scion_ops::analyze_impact(&report.graph, "pkg/util.py").unwrap().direct,
        vec!["pkg/extra.py", "pkg/service.py"]
    );

    let mut knowledge = store.load_knowledge("demo").unwrap();
    assert_eq!(knowledge.learning("pkg/util.py").unwrap().purpose, "build url names");
    assert!(!knowledge.is_stale("pkg/util.py", repo.path()).unwrap());
    assert_eq!(knowledge.runs().filter(|r| r.kind == RunKind::Index).count(), 2);

    edit_file(repo.path(), "pkg/util.py", "def slugify(text):\n    return text\n");
    assert!(knowledge.is_stale("pkg/util.py", repo.path()).unwrap());
    assert_eq!(
        knowledge.refresh("pkg/util.py", repo.path()).unwrap(),
        RefreshOutcome::Refreshed { version: 2 }
    );
    assert!(!knowledge.is_stale("pkg/util.py", repo.path()).unwrap());
}

/// Extract a feature from one project and plan it into another.
#[test]
fn test_extract_then_plan_into_target() {
    let source = create_python_repo();
    let source_store = index(source.path(), "demo");

    let target = create_repo_with_structure(&[
        ("requirements.txt", "flask\n"),
        (
            "src/text.py",
            "import flask\n\n\ndef tokenizer(text):\n    return text.split()\n",
        ),
    ]);
    index(target.path(), "target");

    let registry = ProjectRegistry::from_toml(&format!(
        "[projects.target]\nroot = '{}'\nlanguage = \"python\"\n",
        target.path().display()
    ))
    .unwrap();

    let graph = source_store.require_graph().unwrap();
    let context = SearchContext::new(source_store.config().search.clone()).with_root(source.path());
    let feature = scion_ops::extract_feature(
        &graph,
        source.path(),
        "tokenizer",
        &ExtractOptions::named("tokens"),
        &context,
    )
    .unwrap();
    assert_eq!(feature.components, vec!["pkg/util.py", "pkg/service.py"]);
    source_store.save_feature(&feature).unwrap();

    let feature = source_store.load_feature("tokens").unwrap();
    let target_graph = ProjectStore::open(registry.root("target").unwrap())
        .unwrap()
        .require_graph()
        .unwrap();
    let plan = scion_ops::plan_transplant(&feature, &target_graph, "target");

    assert_eq!(plan.mappings.len(), 1);
    assert_eq!(plan.mappings[0].action, MappingAction::Adapt);
    assert_eq!(plan.mappings[0].target_module.as_deref(), Some("src/text.py"));
    assert_eq!(plan.wiring.len(), 1);
    assert_eq!(plan.wiring[0].file, "requirements.txt");
    assert_eq!(plan.wiring[0].action, WiringAction::AddDependency);
    assert_eq!(plan.wiring[0].detail, "requests");
    assert_eq!(plan.generation_order, feature.components);

    let path = source_store.save_plan(&plan).unwrap();
    assert!(path.ends_with("plans/tokens--target.json"));
    assert_eq!(source_store.load_plan("tokens", "target").unwrap(), plan);
}

/// Impact over an indexed repository agrees with the graph's reverse edges.
#[test]
fn test_impact_over_indexed_repo() {
    let repo = create_python_repo();
    let graph = index(repo.path(), "demo").require_graph().unwrap();

    let report = scion_ops::analyze_impact(&graph, "pkg/service.py").unwrap();
    assert_eq!(report.direct, vec!["pkg/app.py"]);
    assert!(report.indirect.is_empty());
    assert_eq!(report.risk, Risk::Low);

    let report = scion_ops::analyze_impact(&graph, "scripts/tool.py").unwrap();
    assert_eq!(report.total, 0);
}
