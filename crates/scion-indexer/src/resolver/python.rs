use super::{FileIndex, Resolution, join, parent_dir, stdlib};
use crate::parser::Import;

/// Source roots tried for absolute imports before falling back to suffix matching.
const SOURCE_ROOTS: &[&str] = &["", "src", "lib"];

pub(super) fn resolve(importer: &str, import: &Import, index: &FileIndex) -> Resolution {
    if import.level > 0 {
        return resolve_relative(importer, import, index);
    }

    let dotted = import.module.as_str();
    let top = dotted.split('.').next().unwrap_or(dotted);
    let base = dotted.replace('.', "/");

    let rooted = SOURCE_ROOTS
        .iter()
        .find_map(|root| module_file(index, &join(root, &base)));
    if let Some(found) = rooted {
        return Resolution::Internal(with_submodules(index, &found, import));
    }

    if stdlib::is_python(top) {
        return Resolution::Stdlib;
    }

    let suffixed = index
        .suffix_match(&format!("{base}.py"))
        .or_else(|| index.suffix_match(&format!("{base}/__init__.py")));
    match suffixed {
        Some(found) => Resolution::Internal(with_submodules(index, found, import)),
        None => Resolution::External(top.to_string()),
    }
}

/// `from .x import y` resolves against the importer's package; each extra
/// dot climbs one directory.
fn resolve_relative(importer: &str, import: &Import, index: &FileIndex) -> Resolution {
    let mut dir = parent_dir(importer);
    for _ in 1..import.level {
        if dir.is_empty() {
            return Resolution::Unresolved;
        }
        dir = parent_dir(dir);
    }

    if import.module.is_empty() {
        // `from . import a, b`: names are usually submodules.
        let mut found: Vec<String> = import
            .names
            .iter()
            .filter_map(|name| module_file(index, &join(dir, name)))
            .collect();
        if found.is_empty() {
            found.extend(index.first_existing([join(dir, "__init__.py")]));
        }
        return Resolution::internal_or_unresolved(found);
    }

    let base = join(dir, &import.module.replace('.', "/"));
    match module_file(index, &base) {
        Some(found) => Resolution::Internal(with_submodules(index, &found, import)),
        None => Resolution::Unresolved,
    }
}

/// `a/b` as `a/b.py` or the package `a/b/__init__.py`.
fn module_file(index: &FileIndex, base: &str) -> Option<String> {
    index.first_existing([format!("{base}.py"), format!("{base}/__init__.py")])
}

/// A from-import out of a package may name submodules: `from pkg import util`.
fn with_submodules(index: &FileIndex, found: &str, import: &Import) -> Vec<String> {
    let mut paths = vec![found.to_string()];
    if !found.ends_with("__init__.py") {
        return paths;
    }
    let package = parent_dir(found);
    for name in import.names.iter().filter(|n| n.as_str() != "*") {
        if let Some(sub) = module_file(index, &join(package, name)) {
            if !paths.contains(&sub) {
                paths.push(sub);
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::EdgeKind;

    fn index() -> FileIndex {
        FileIndex::new(
            [
                "pkg/__init__.py",
                "pkg/util.py",
                "pkg/service.py",
                "pkg/sub/__init__.py",
                "pkg/sub/deep.py",
                "src/app/main.py",
                "src/app/config.py",
                "tools/types.py",
            ]
            .map(String::from),
        )
    }

    fn from(module: &str, level: u32, names: &[&str]) -> Import {
        Import::new(module, EdgeKind::FromImport, 1)
            .with_level(level)
            .with_names(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_absolute_imports() {
        let index = index();
        let plain = Import::new("pkg.util", EdgeKind::Import, 1);
        assert_eq!(
            resolve("pkg/service.py", &plain, &index),
            Resolution::Internal(vec!["pkg/util.py".into()])
        );
        // Source roots are searched for `app.config`.
        let nested = Import::new("app.config", EdgeKind::Import, 1);
        assert_eq!(
            resolve("src/app/main.py", &nested, &index),
            Resolution::Internal(vec!["src/app/config.py".into()])
        );
        assert_eq!(
            resolve("pkg/service.py", &from("pkg", 0, &["util", "VERSION"]), &index),
            Resolution::Internal(vec!["pkg/__init__.py".into(), "pkg/util.py".into()])
        );
    }

    #[test]
    fn test_stdlib_and_external() {
        let index = index();
        assert_eq!(
            resolve("pkg/util.py", &Import::new("os.path", EdgeKind::Import, 1), &index),
            Resolution::Stdlib
        );
        // A stdlib name shadowed deep in the tree is still the stdlib.
        assert_eq!(
            resolve("pkg/util.py", &Import::new("types", EdgeKind::Import, 1), &index),
            Resolution::Stdlib
        );
        assert_eq!(
            resolve("pkg/util.py", &from("requests.adapters", 0, &["HTTPAdapter"]), &index),
            Resolution::External("requests".into())
        );
    }

    #[test]
    fn test_relative_imports() {
        let index = index();
        assert_eq!(
            resolve("pkg/service.py", &from("util", 1, &["slugify"]), &index),
            Resolution::Internal(vec!["pkg/util.py".into()])
        );
        assert_eq!(
            resolve("pkg/sub/deep.py", &from("service", 2, &["Tokenizer"]), &index),
            Resolution::Internal(vec!["pkg/service.py".into()])
        );
        assert_eq!(
            resolve("pkg/sub/deep.py", &from("", 2, &["util"]), &index),
            Resolution::Internal(vec!["pkg/util.py".into()])
        );
        assert_eq!(
            resolve("pkg/service.py", &from("missing", 1, &["x"]), &index),
            Resolution::Unresolved
        );
        assert_eq!(
            resolve("pkg/service.py", &from("", 4, &["x"]), &index),
            Resolution::Unresolved
        );
    }
}
