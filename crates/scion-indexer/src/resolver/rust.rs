use super::{FileIndex, Resolution, join, parent_dir, stdlib};
use crate::parser::Import;
use scion_core::EdgeKind;

pub(super) fn resolve(importer: &str, import: &Import, index: &FileIndex) -> Resolution {
    if import.kind == EdgeKind::Mod {
        let found = module_file(index, &join(&module_dir(importer), &import.module));
        return Resolution::internal_or_unresolved(found.into_iter().collect());
    }

    let segments: Vec<&str> = import.module.split("::").filter(|s| !s.is_empty()).collect();
    let Some(&first) = segments.first() else {
        return Resolution::Unresolved;
    };

    let (base, rest) = match first {
        "crate" => match crate_root(importer, index) {
            Some(root) => (root, &segments[1..]),
            None => return Resolution::Unresolved,
        },
        "self" => (module_dir(importer), &segments[1..]),
        "super" => {
            let mut dir = module_dir(importer);
            let mut depth = 0;
            while segments.get(depth) == Some(&"super") {
                dir = parent_dir(&dir).to_string();
                depth += 1;
            }
            (dir, &segments[depth..])
        }
        top if stdlib::is_rust(top) => return Resolution::Stdlib,
        top => {
            let dir = module_dir(importer);
            if module_file(index, &join(&dir, top)).is_some() {
                (dir, &segments[..])
            } else if let Some(root) = workspace_crate(index, top) {
                (root, &segments[1..])
            } else {
                return Resolution::External(top.to_string());
            }
        }
    };

    Resolution::internal_or_unresolved(resolve_within(index, &base, rest, &import.names))
}

/// Resolve `rest::{names}` below the module directory `base`. Names that are
/// themselves modules resolve to their own files; anything else lands on the
/// deepest module file along `rest`.
fn resolve_within(index: &FileIndex, base: &str, rest: &[&str], names: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut needs_parent = names.is_empty();
    for name in names {
        if name == "self" || name == "*" {
            needs_parent = true;
            continue;
        }
        let mut path: Vec<&str> = rest.to_vec();
        path.push(name);
        match module_file(index, &join(base, &path.join("/"))) {
            Some(file) if !found.contains(&file) => found.push(file),
            Some(_) => {}
            None => needs_parent = true,
        }
    }
    if needs_parent {
        if let Some(file) = deepest_module(index, base, rest) {
            if !found.contains(&file) {
                found.push(file);
            }
        }
    }
    found
}

fn deepest_module(index: &FileIndex, base: &str, rest: &[&str]) -> Option<String> {
    (1..=rest.len())
        .rev()
        .find_map(|k| module_file(index, &join(base, &rest[..k].join("/"))))
        .or_else(|| {
            index.first_existing([
                join(base, "lib.rs"),
                join(base, "main.rs"),
                join(base, "mod.rs"),
                format!("{base}.rs"),
            ])
        })
}

/// `a/b` as `a/b.rs` or `a/b/mod.rs`.
fn module_file(index: &FileIndex, base: &str) -> Option<String> {
    index.first_existing([format!("{base}.rs"), format!("{base}/mod.rs")])
}

/// Directory holding the child modules of `path`: `src/` for `src/lib.rs`
/// and `src/graph/mod.rs`'s own directory, `src/graph/` for `src/graph.rs`.
fn module_dir(path: &str) -> String {
    let dir = parent_dir(path);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file {
        "lib.rs" | "main.rs" | "mod.rs" => dir.to_string(),
        other => join(dir, other.trim_end_matches(".rs")),
    }
}

/// Nearest enclosing directory holding `lib.rs` or `main.rs`.
fn crate_root(importer: &str, index: &FileIndex) -> Option<String> {
    let mut dir = parent_dir(importer);
    loop {
        if index.contains(&join(dir, "lib.rs")) || index.contains(&join(dir, "main.rs")) {
            return Some(dir.to_string());
        }
        if dir.is_empty() {
            return None;
        }
        dir = parent_dir(dir);
    }
}

/// Another crate of the same workspace: `scion_core` in `crates/scion-core/src/lib.rs`.
fn workspace_crate(index: &FileIndex, name: &str) -> Option<String> {
    let dashed = name.replace('_', "-");
    [dashed.as_str(), name]
        .iter()
        .find_map(|dir| index.suffix_match(&format!("{dir}/src/lib.rs")))
        .map(|lib| parent_dir(lib).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> FileIndex {
        FileIndex::new(
            [
                "src/lib.rs",
                "src/model.rs",
                "src/graph/mod.rs",
                "src/graph/view.rs",
                "src/store.rs",
                "src/store/layout.rs",
                "crates/scion-core/src/lib.rs",
                "crates/scion-core/src/graph.rs",
            ]
            .map(String::from),
        )
    }

    fn use_(module: &str, names: &[&str]) -> Import {
        Import::new(module, EdgeKind::Use, 1).with_names(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_mod_declarations() {
        let index = index();
        let graph = Import::new("graph", EdgeKind::Mod, 1);
        assert_eq!(
            resolve("src/lib.rs", &graph, &index),
            Resolution::Internal(vec!["src/graph/mod.rs".into()])
        );
        let layout = Import::new("layout", EdgeKind::Mod, 1);
        assert_eq!(
            resolve("src/store.rs", &layout, &index),
            Resolution::Internal(vec!["src/store/layout.rs".into()])
        );
        let missing = Import::new("missing", EdgeKind::Mod, 1);
        assert_eq!(resolve("src/lib.rs", &missing, &index), Resolution::Unresolved);
    }

    #[test]
    fn test_crate_paths() {
        let index = index();
        assert_eq!(
            resolve("src/store.rs", &use_("crate::model", &["Module"]), &index),
            Resolution::Internal(vec!["src/model.rs".into()])
        );
        assert_eq!(
            resolve("src/store.rs", &use_("crate", &["model", "graph"]), &index),
            Resolution::Internal(vec!["src/model.rs".into(), "src/graph/mod.rs".into()])
        );
        assert_eq!(
            resolve("src/store.rs", &use_("crate::graph::view", &["View"]), &index),
            Resolution::Internal(vec!["src/graph/view.rs".into()])
        );
        assert_eq!(
            resolve("src/model.rs", &use_("crate", &["Error"]), &index),
            Resolution::Internal(vec!["src/lib.rs".into()])
        );
    }

    #[test]
    fn test_relative_paths() {
        let index = index();
        assert_eq!(
            resolve("src/graph/view.rs", &use_("super", &["*"]), &index),
            Resolution::Internal(vec!["src/graph/mod.rs".into()])
        );
        assert_eq!(
            resolve("src/graph/view.rs", &use_("super::super::model", &["Module"]), &index),
            Resolution::Internal(vec!["src/model.rs".into()])
        );
        assert_eq!(
            resolve("src/graph/mod.rs", &use_("self::view", &["View"]), &index),
            Resolution::Internal(vec!["src/graph/view.rs".into()])
        );
    }

    #[test]
    fn test_external_and_std() {
        let index = index();
        assert_eq!(
            resolve("src/lib.rs", &use_("std::collections", &["BTreeMap"]), &index),
            Resolution::Stdlib
        );
        assert_eq!(
            resolve("src/lib.rs", &use_("serde", &["Serialize"]), &index),
            Resolution::External("serde".into())
        );
        assert_eq!(
            resolve("src/lib.rs", &use_("scion_core::graph", &["Graph"]), &index),
            Resolution::Internal(vec!["crates/scion-core/src/graph.rs".into()])
        );
    }
}
