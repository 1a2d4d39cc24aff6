use super::{FileIndex, Resolution, join, normalize, parent_dir, stdlib};
use crate::parser::Import;

const EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".cjs"];

/// Path aliases commonly mapped to the source root.
const ALIASES: &[(&str, &[&str])] = &[("@/", &["src", ""]), ("~/", &["src", ""])];

pub(super) fn resolve(importer: &str, import: &Import, index: &FileIndex) -> Resolution {
    let specifier = import.module.split(['?', '#']).next().unwrap_or_default();
    if specifier.is_empty() {
        return Resolution::Unresolved;
    }

    if specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/') {
        let joined = if specifier.starts_with('/') {
            specifier.to_string()
        } else {
            join(parent_dir(importer), specifier)
        };
        let found = normalize(&joined).and_then(|base| file_for(index, &base));
        return Resolution::internal_or_unresolved(found.into_iter().collect());
    }

    for (alias, roots) in ALIASES {
        if let Some(rest) = specifier.strip_prefix(alias) {
            let found = roots
                .iter()
                .find_map(|root| file_for(index, &join(root, rest)));
            return Resolution::internal_or_unresolved(found.into_iter().collect());
        }
    }

    if stdlib::is_node(specifier) {
        return Resolution::Stdlib;
    }

    // Bare paths like `components/Button` under a configured base URL.
    if !specifier.starts_with('@') && specifier.contains('/') {
        let found = candidates(specifier)
            .iter()
            .find_map(|c| index.suffix_match(c).map(str::to_string));
        if let Some(found) = found {
            return Resolution::Internal(vec![found]);
        }
    }

    Resolution::External(package_name(specifier))
}

/// `lodash/fp` is `lodash`; `@scope/pkg/sub` is `@scope/pkg`.
fn package_name(specifier: &str) -> String {
    let take = if specifier.starts_with('@') { 2 } else { 1 };
    specifier.split('/').take(take).collect::<Vec<_>>().join("/")
}

fn file_for(index: &FileIndex, base: &str) -> Option<String> {
    index.first_existing(candidates(base))
}

/// The file itself, then with each extension, then as a directory index.
/// A `.js` specifier may name a TypeScript source compiled to `.js`.
fn candidates(base: &str) -> Vec<String> {
    let mut out = vec![base.to_string()];
    for ext in [".js", ".jsx", ".mjs", ".cjs"] {
        if let Some(stem) = base.strip_suffix(ext) {
            out.push(format!("{stem}.ts"));
            out.push(format!("{stem}.tsx"));
        }
    }
    out.extend(EXTENSIONS.iter().map(|ext| format!("{base}{ext}")));
    out.extend(EXTENSIONS.iter().map(|ext| format!("{}{ext}", join(base, "index"))));
    out
}
