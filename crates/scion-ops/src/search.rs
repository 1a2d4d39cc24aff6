//! Ranked search over modules and learnings
//!
//! Every call scans the whole corpus. Scores are a weighted Jaccard overlap
//! of query tokens against each field, plus a bonus when the query appears
//! verbatim in the item's most salient field, plus recency, minus
//! staleness, all multiplied by confidence.

use chrono::{DateTime, Duration, Utc};
use scion_core::config::SearchConfig;
use scion_core::{Graph, KnowledgeStore, Learning, Module};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Something that can be ranked against a query.
pub trait Searchable {
    /// `(weight, text)` per field.
    fn fields(&self) -> Vec<(f32, String)>;

    /// Field checked for a verbatim match of the query.
    fn salient(&self) -> &str;

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn confidence(&self) -> Option<f32> {
        None
    }

    fn is_stale(&self, _root: &Path) -> bool {
        false
    }
}

impl Searchable for Module {
    fn fields(&self) -> Vec<(f32, String)> {
        let names: Vec<&str> = self.interfaces.iter().map(|i| i.name.as_str()).collect();
        let docs: Vec<&str> = self.interfaces.iter().map(|i| i.doc.as_str()).collect();
        vec![
            (0.30, self.path.clone()),
            (0.30, self.summary.clone()),
            (0.25, names.join(" ")),
            (0.15, docs.join(" ")),
        ]
    }

    fn salient(&self) -> &str {
        &self.path
    }
}

impl Searchable for Learning {
    fn fields(&self) -> Vec<(f32, String)> {
        let functions: Vec<String> = self
            .key_functions
            .iter()
            .map(|(name, what)| format!("{name} {what}"))
            .collect();
        vec![
            (0.20, self.module_path.clone()),
            (0.30, self.summary.clone()),
            (0.20, self.purpose.clone()),
            (0.20, functions.join(" ")),
            (0.10, self.gotchas.join(" ")),
        ]
    }

    fn salient(&self) -> &str {
        &self.summary
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }

    fn confidence(&self) -> Option<f32> {
        Some(self.confidence)
    }

    fn is_stale(&self, root: &Path) -> bool {
        Learning::is_stale(self, root)
    }
}

/// Ranking constants plus the optional project root for staleness checks.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub config: SearchConfig,
    pub root: Option<PathBuf>,
    pub now: DateTime<Utc>,
}

impl Default for SearchContext {
    fn default() -> Self {
        SearchContext::new(SearchConfig::default())
    }
}

impl SearchContext {
    pub fn new(config: SearchConfig) -> Self {
        SearchContext {
            config,
            root: None,
            now: Utc::now(),
        }
    }

    /// Penalise stale items, checked against this project root.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Measure recency from a fixed instant.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Hit<'a, T> {
    pub item: &'a T,
    pub score: f32,
}

/// Rank `corpus` against `query`, best first. Ties keep corpus order.
pub fn search<'a, T, I>(corpus: I, query: &str, limit: usize, context: &SearchContext) -> Vec<Hit<'a, T>>
where
    T: Searchable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || limit == 0 {
        return Vec::new();
    }
    let needle = query.trim().to_lowercase();

    let mut hits: Vec<Hit<'a, T>> = corpus
        .into_iter()
        .map(|item| Hit {
            item,
            score: score(item, &query_tokens, &needle, context),
        })
        .filter(|hit| hit.score >= context.config.epsilon)
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit);
    hits
}

/// Search the modules of a graph.
pub fn search_code<'a>(graph: &'a Graph, query: &str, limit: usize, context: &SearchContext) -> Vec<Hit<'a, Module>> {
    search(graph.modules.values(), query, limit, context)
}

/// Search the learnings of a knowledge document.
pub fn search_knowledge<'a>(
    knowledge: &'a KnowledgeStore,
    query: &str,
    limit: usize,
    context: &SearchContext,
) -> Vec<Hit<'a, Learning>> {
    search(knowledge.learnings(), query, limit, context)
}

fn score<T: Searchable>(item: &T, query: &BTreeSet<String>, needle: &str, context: &SearchContext) -> f32 {
    let config = &context.config;
    let mut score: f32 = item
        .fields()
        .iter()
        .map(|(weight, text)| weight * jaccard(query, &tokenize(text)))
        .sum();

    if !needle.is_empty() && item.salient().to_lowercase().contains(needle) {
        score += config.substring_bonus;
    }

    if let Some(updated) = item.updated_at() {
        let age = context.now.signed_duration_since(updated);
        if age < Duration::days(7) {
            score += config.recent_bonus;
        } else if age < Duration::days(30) {
            score += config.month_bonus;
        }
    }

    if let Some(root) = &context.root {
        if item.is_stale(root) {
            score -= config.stale_penalty;
        }
    }

    if let Some(confidence) = item.confidence() {
        score *= confidence.clamp(0.0, 1.0);
    }
    score
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

/// Lowercase tokens of at least two characters. Words are split on anything
/// that is not alphanumeric, on `_`, and at camelCase boundaries.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        for part in split_camel(word) {
            if part.chars().count() >= 2 {
                tokens.insert(part.to_lowercase());
            }
        }
    }
    tokens
}

/// `parseHTTPResponse` -> `parse`, `HTTP`, `Response`.
fn split_camel(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 1..chars.len() {
        let (at, current) = chars[i];
        let previous = chars[i - 1].1;
        let next_lower = chars.get(i + 1).is_some_and(|(_, c)| c.is_lowercase());
        let boundary = current.is_uppercase()
            && (previous.is_lowercase() || previous.is_numeric() || (previous.is_uppercase() && next_lower));
        if boundary {
            parts.push(&word[start..at]);
            start = at;
        }
    }
    if start < word.len() {
        parts.push(&word[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_core::{Interface, InterfaceKind, Language};

    fn module(path: &str, summary: &str, interfaces: &[&str]) -> Module {
        let mut module = Module::new(path, Language::Python);
        module.summary = summary.into();
        module.interfaces = interfaces
            .iter()
            .map(|name| Interface {
                name: name.to_string(),
                kind: InterfaceKind::Function,
                signature: format!("def {name}()"),
                doc: String::new(),
                members: Vec::new(),
                line: 1,
            })
            .collect();
        module
    }

    #[test]
    fn test_tokenize() {
        let tokens: Vec<String> = tokenize("parseHTTPResponse snake_case x a1 /src/Graph.rs").into_iter().collect();
        assert_eq!(
            tokens,
            vec!["a1", "case", "graph", "http", "parse", "response", "rs", "snake", "src"]
        );
    }

    #[test]
    fn test_code_search_ranks_and_drops() {
        let corpus = vec![
            module("src/billing/invoice.py", "Invoice rendering.", &["render_invoice"]),
            module("src/auth/session.py", "Session tokens.", &["create_session"]),
            module("src/billing/tax.py", "Tax tables for invoices.", &["tax_rate"]),
        ];
        let hits = search(&corpus, "invoice", 10, &SearchContext::default());
        let paths: Vec<&str> = hits.iter().map(|h| h.item.path.as_str()).collect();
        assert_eq!(paths, vec!["src/billing/invoice.py"]);
        assert!(hits[0].score > 0.5);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let corpus = vec![
            module("a/render.py", "", &[]),
            module("b/render.py", "", &[]),
            module("c/render.py", "", &[]),
        ];
        let context = SearchContext::default();
        let first = search(&corpus, "render", 2, &context);
        let second = search(&corpus, "render", 2, &context);
        let paths = |hits: &[Hit<'_, Module>]| hits.iter().map(|h| h.item.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&first[..]), vec!["a/render.py", "b/render.py"]);
        assert_eq!(paths(&first[..]), paths(&second[..]));
    }

    #[test]
    fn test_knowledge_recency_and_confidence() {
        let now = Utc::now();
        let mut old = Learning::new("src/cache.py", "LRU cache for sessions");
        old.updated_at = now - Duration::days(60);
        let mut fresh = Learning::new("src/store.py", "LRU cache for rows");
        fresh.updated_at = now - Duration::days(1);
        let unsure = Learning::new("src/guess.py", "LRU cache maybe").with_confidence(0.1);

        let corpus = vec![old, fresh, unsure];
        let hits = search(&corpus, "lru cache", 10, &SearchContext::default().at(now));
        let paths: Vec<&str> = hits.iter().map(|h| h.item.module_path.as_str()).collect();
        assert_eq!(paths, vec!["src/store.py", "src/cache.py", "src/guess.py"]);
        assert!(hits[2].score < hits[1].score * 0.5);
    }

    #[test]
    fn test_empty_query() {
        let corpus = vec![module("src/a.py", "anything", &[])];
        assert!(search(&corpus, "  ", 5, &SearchContext::default()).is_empty());
    }
}
