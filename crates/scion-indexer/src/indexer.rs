//! Indexing pipeline: walk, parse, resolve, assemble
//!
//! An index run builds a fresh [`Graph`] from the tree on disk. Nothing from
//! a previous graph is merged in; knowledge lives in its own document and is
//! only touched to record the run.

use crate::languages::parser_for;
use crate::parser::{Fidelity, LanguageParser, ParseError, ParsedFile};
use crate::parser_pool::ParserPool;
use crate::resolver::{FileIndex, Resolution, resolve};
use crate::walker::{SourceFile, Walker};
use scion_core::{
    Edge, Error, Graph, Language, MigrationReport, Module, ProjectStore, Result, RunKind,
    ScionConfig, detect_language,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub project: String,
    /// Declared language; detected from manifest files when absent.
    pub language: Option<Language>,
    pub extra_excludes: Vec<String>,
    pub max_file_bytes: u64,
}

impl IndexOptions {
    pub fn new(project: impl Into<String>) -> Self {
        Self::from_config(project, &ScionConfig::default())
    }

    pub fn from_config(project: impl Into<String>, config: &ScionConfig) -> Self {
        IndexOptions {
            project: project.into(),
            language: None,
            extra_excludes: config.index.extra_excludes.clone(),
            max_file_bytes: config.index.max_file_bytes,
        }
    }

    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }
}

/// A file that was walked but could not be parsed.
#[derive(Debug)]
pub struct ParseFailure {
    pub path: String,
    pub error: ParseError,
}

#[derive(Debug)]
pub struct IndexReport {
    pub graph: Graph,
    pub failures: Vec<ParseFailure>,
    /// Parser tier used for each language seen in the run.
    pub fidelity: BTreeMap<Language, Fidelity>,
    /// Legacy knowledge moved out of the old graph document before the run.
    pub migrated: MigrationReport,
}

pub struct Indexer {
    root: PathBuf,
    options: IndexOptions,
}

impl Indexer {
    pub fn new(root: impl AsRef<Path>, options: IndexOptions) -> Self {
        Indexer {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Indexer for a store's project root, configured from the store's config.
    pub fn for_store(store: &ProjectStore, project: impl Into<String>, language: Option<Language>) -> Self {
        let options = IndexOptions::from_config(project, store.config()).with_language(language);
        Indexer::new(store.root(), options)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn language(&self) -> Result<Language> {
        self.options
            .language
            .or_else(|| detect_language(&self.root))
            .ok_or_else(|| Error::not_found("project language", self.root.display().to_string()))
    }

    /// Build a graph of the tree as it is now. Nothing is persisted.
    pub fn index(&self) -> Result<IndexReport> {
        let language = self.language()?;
        tracing::info!("Indexing {} ({}) at {}", self.options.project, language, self.root.display());

        let files = Walker::new(&self.root, language)
            .with_excludes(self.options.extra_excludes.iter().cloned())
            .files()?;

        let mut pool = ParserPool::new();
        let mut parsers: BTreeMap<Language, Box<dyn LanguageParser>> = BTreeMap::new();
        let mut fidelity = BTreeMap::new();
        let mut failures = Vec::new();
        let mut parsed: Vec<(SourceFile, ParsedFile)> = Vec::with_capacity(files.len());
        let walked: Vec<String> = files.iter().map(|file| file.module_path.clone()).collect();

        for file in files {
            let parser = parsers
                .entry(file.language)
                .or_insert_with(|| {
                    let parser = parser_for(file.language);
                    tracing::debug!("{} files use {} parsing", parser.language(), parser.fidelity());
                    fidelity.insert(parser.language(), parser.fidelity());
                    parser
                });
            match self.parse_file(parser.as_ref(), &mut pool, &file) {
                Ok(result) => {
                    tracing::debug!(
                        "Parsed {} ({} lines, {} imports, {} fidelity)",
                        file.module_path,
                        result.line_count,
                        result.imports.len(),
                        result.fidelity
                    );
                    parsed.push((file, result));
                }
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", file.module_path, error);
                    failures.push(ParseFailure {
                        path: file.module_path,
                        error,
                    });
                }
            }
        }

        let go_module = match language {
            Language::Go => read_go_module(&self.root),
            _ => None,
        };
        // Imports of files that failed to parse still count as internal;
        // assemble drops them since they never become modules.
        let index = FileIndex::new(walked).with_go_module(go_module);
        let modules: BTreeSet<String> = parsed.iter().map(|(file, _)| file.module_path.clone()).collect();

        let mut graph = Graph::new(&self.options.project);
        for (file, result) in parsed {
            let (module, edges) = assemble(file, result, &index, &modules);
            graph.insert_module(module);
            for edge in edges {
                graph.add_edge(edge);
            }
        }

        for (language, tier) in &fidelity {
            if *tier == Fidelity::Pattern {
                tracing::info!("{} files were read with best-effort pattern parsing", language);
            }
        }
        tracing::info!(
            "Indexed {} modules, {} edges, {} failures",
            graph.module_count(),
            graph.edge_count(),
            failures.len()
        );

        Ok(IndexReport {
            graph,
            failures,
            fidelity,
            migrated: MigrationReport::default(),
        })
    }

    /// Migrate legacy knowledge, index, replace the graph document, and
    /// record the run in the knowledge document.
    pub fn reindex(&self, store: &ProjectStore) -> Result<IndexReport> {
        let migrated = store.migrate_legacy_knowledge()?;
        let mut report = self.index()?;
        report.migrated = migrated;

        store.save_graph(&report.graph)?;

        let mut knowledge = store.load_knowledge(&self.options.project)?;
        knowledge.record_run(
            RunKind::Index,
            format!(
                "{} modules, {} edges, {} failures",
                report.graph.module_count(),
                report.graph.edge_count(),
                report.failures.len()
            ),
        );
        store.save_knowledge(&mut knowledge)?;
        Ok(report)
    }

    fn parse_file(
        &self,
        parser: &dyn LanguageParser,
        pool: &mut ParserPool,
        file: &SourceFile,
    ) -> std::result::Result<ParsedFile, ParseError> {
        if file.size > self.options.max_file_bytes {
            return Err(ParseError::TooLarge {
                size: file.size,
                limit: self.options.max_file_bytes,
            });
        }
        let bytes = std::fs::read(&file.path)?;
        let source = String::from_utf8(bytes).map_err(|_| ParseError::NotUtf8)?;
        parser.parse(pool, &file.module_path, &source)
    }
}

/// Turn one parsed file into its module and outgoing edges.
fn assemble(
    file: SourceFile,
    parsed: ParsedFile,
    index: &FileIndex,
    modules: &BTreeSet<String>,
) -> (Module, Vec<Edge>) {
    let mut module = Module::new(file.module_path, file.language);
    module.lines = parsed.line_count;
    module.summary = parsed.summary;
    module.interfaces = parsed
        .declarations
        .into_iter()
        .map(|d| d.into_interface())
        .collect();

    let mut edges: Vec<Edge> = Vec::new();
    for import in &parsed.imports {
        let targets = match resolve(file.language, &module.path, import, index) {
            Resolution::Internal(paths) => {
                let paths: Vec<String> = paths.into_iter().filter(|p| modules.contains(p)).collect();
                if paths.is_empty() {
                    tracing::trace!("{}:{} import {} names an unparsed file", module.path, import.line, import.module);
                    continue;
                }
                for path in &paths {
                    push_unique(&mut module.internal_deps, path);
                }
                paths
            }
            Resolution::External(package) => {
                push_unique(&mut module.external_deps, &package);
                vec![package]
            }
            Resolution::Stdlib => continue,
            Resolution::Unresolved => {
                tracing::trace!("{}:{} unresolved import {}", module.path, import.line, import.module);
                continue;
            }
        };
        for target in targets {
            let edge = Edge {
                source: module.path.clone(),
                target,
                kind: import.kind,
                specifics: import.names.clone(),
            };
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }
    (module, edges)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// The `module` line of `go.mod`.
fn read_go_module(root: &Path) -> Option<String> {
    let text = std::fs::read_to_string(root.join("go.mod")).ok()?;
    text.lines()
        .find_map(|line| line.trim().strip_prefix("module "))
        .map(|m| m.trim().trim_matches('"').to_string())
}
