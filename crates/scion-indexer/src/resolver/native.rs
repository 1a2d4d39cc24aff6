use super::{FileIndex, Resolution, join, normalize, parent_dir, stdlib};
use crate::parser::Import;

/// A Go import names a package directory: every non-test file in it.
pub(super) fn resolve_go(import: &Import, index: &FileIndex) -> Resolution {
    let path = import.module.as_str();
    if let Some(module) = index.go_module() {
        let local = if path == module {
            Some("")
        } else {
            path.strip_prefix(module).and_then(|rest| rest.strip_prefix('/'))
        };
        if let Some(dir) = local {
            let files = index
                .files_in_dir(dir)
                .filter(|f| f.ends_with(".go") && !f.ends_with("_test.go"))
                .map(str::to_string)
                .collect();
            return Resolution::internal_or_unresolved(files);
        }
    }
    if stdlib::is_go(path) {
        return Resolution::Stdlib;
    }
    // Module paths on the common hosts are three segments deep.
    Resolution::External(path.split('/').take(3).collect::<Vec<_>>().join("/"))
}

pub(super) fn resolve_java(import: &Import, index: &FileIndex) -> Resolution {
    let module = import.module.as_str();
    if stdlib::is_java(module) {
        return Resolution::Stdlib;
    }
    let path = module.replace('.', "/");

    if import.names.iter().any(|n| n == "*") {
        let files: Vec<String> = index
            .files_in_dir_suffix(&path)
            .filter(|f| f.ends_with(".java"))
            .map(str::to_string)
            .collect();
        if !files.is_empty() {
            return Resolution::Internal(files);
        }
    } else {
        // The class itself, or its enclosing class for a static member import.
        let found = index
            .suffix_match(&format!("{path}.java"))
            .or_else(|| index.suffix_match(&format!("{}.java", parent_dir(&path))));
        if let Some(found) = found {
            return Resolution::Internal(vec![found.to_string()]);
        }
    }

    Resolution::External(module.split('.').take(3).collect::<Vec<_>>().join("."))
}

/// `"local.h"` is looked up beside the includer first; `<system.h>` only
/// matches a project file when it is not a standard header.
pub(super) fn resolve_include(importer: &str, import: &Import, index: &FileIndex) -> Resolution {
    let raw = import.module.as_str();
    let quoted = raw.starts_with('"');
    let header = raw.trim_matches(['"', '<', '>']);
    if header.is_empty() {
        return Resolution::Unresolved;
    }

    if quoted {
        let found = normalize(&join(parent_dir(importer), header))
            .and_then(|beside| index.first_existing([beside, header.to_string()]))
            .or_else(|| index.suffix_match(header).map(str::to_string));
        return match found {
            Some(found) => Resolution::Internal(vec![found]),
            None if stdlib::is_c_header(header) => Resolution::Stdlib,
            None => Resolution::Unresolved,
        };
    }

    if stdlib::is_c_header(header) {
        return Resolution::Stdlib;
    }
    if let Some(found) = index.suffix_match(header) {
        return Resolution::Internal(vec![found.to_string()]);
    }
    let top = header.split('/').next().unwrap_or(header);
    let name = top.split('.').next().unwrap_or(top);
    Resolution::External(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::EdgeKind;

    #[test]
    fn test_go_packages() {
        let index = FileIndex::new(
            ["main.go", "store/store.go", "store/query.go", "store/store_test.go"].map(String::from),
        )
        .with_go_module(Some("example.com/app".into()));

        let local = Import::new("example.com/app/store", EdgeKind::Import, 1);
        assert_eq!(
            resolve_go(&local, &index),
            Resolution::Internal(vec!["store/query.go".into(), "store/store.go".into()])
        );
        let std = Import::new("net/http", EdgeKind::Import, 1);
        assert_eq!(resolve_go(&std, &index), Resolution::Stdlib);
        let ext = Import::new("github.com/sirupsen/logrus/hooks/syslog", EdgeKind::Import, 1);
        assert_eq!(
            resolve_go(&ext, &index),
            Resolution::External("github.com/sirupsen/logrus".into())
        );
    }

    #[test]
    fn test_java_imports() {
        let index = FileIndex::new(
            [
                "src/main/java/com/shop/core/Money.java",
                "src/main/java/com/shop/core/Currency.java",
                "src/main/java/com/shop/orders/OrderService.java",
            ]
            .map(String::from),
        );
        let class = Import::new("com.shop.core.Money", EdgeKind::Import, 1).with_names(vec!["Money".into()]);
        assert_eq!(
            resolve_java(&class, &index),
            Resolution::Internal(vec!["src/main/java/com/shop/core/Money.java".into()])
        );
        let wildcard = Import::new("com.shop.core", EdgeKind::Import, 1).with_names(vec!["*".into()]);
        assert_eq!(
            resolve_java(&wildcard, &index),
            Resolution::Internal(vec![
                "src/main/java/com/shop/core/Currency.java".into(),
                "src/main/java/com/shop/core/Money.java".into(),
            ])
        );
        let member = Import::new("com.shop.core.Money.ZERO", EdgeKind::Import, 1).with_names(vec!["ZERO".into()]);
        assert_eq!(
            resolve_java(&member, &index),
            Resolution::Internal(vec!["src/main/java/com/shop/core/Money.java".into()])
        );
        let std = Import::new("java.util.List", EdgeKind::Import, 1).with_names(vec!["List".into()]);
        assert_eq!(resolve_java(&std, &index), Resolution::Stdlib);
        let ext = Import::new("org.junit.jupiter.api.Test", EdgeKind::Import, 1).with_names(vec!["Test".into()]);
        assert_eq!(resolve_java(&ext, &index), Resolution::External("org.junit.jupiter".into()));
    }

    #[test]
    fn test_includes() {
        let index = FileIndex::new(["src/ring.c", "src/ring.h", "include/util/math.h"].map(String::from));
        let include = |raw: &str| Import::new(raw, EdgeKind::Include, 1);

        assert_eq!(
            resolve_include("src/ring.c", &include("\"ring.h\""), &index),
            Resolution::Internal(vec!["src/ring.h".into()])
        );
        assert_eq!(
            resolve_include("src/ring.c", &include("\"util/math.h\""), &index),
            Resolution::Internal(vec!["include/util/math.h".into()])
        );
        assert_eq!(
            resolve_include("src/ring.c", &include("<util/math.h>"), &index),
            Resolution::Internal(vec!["include/util/math.h".into()])
        );
        assert_eq!(resolve_include("src/ring.c", &include("<stdio.h>"), &index), Resolution::Stdlib);
        assert_eq!(
            resolve_include("src/ring.c", &include("<zlib.h>"), &index),
            Resolution::External("zlib".into())
        );
        assert_eq!(
            resolve_include("src/ring.c", &include("<boost/asio.hpp>"), &index),
            Resolution::External("boost".into())
        );
        assert_eq!(resolve_include("src/ring.c", &include("\"gen.h\""), &index), Resolution::Unresolved);
    }
}
