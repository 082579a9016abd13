//! Sparse lexical index: BM25 over whole parent units.
//!
//! Deliberately asymmetric with the dense index: dense search runs over
//! small child windows for precision, BM25 runs over full parents so rare
//! terms anywhere in a unit still surface it. The index is built wholesale
//! from the complete parent set and has no incremental path — any corpus
//! change requires a rebuild from the parent store.

use fuserag_core::models::{ParentId, ParentUnit};
use std::collections::{HashMap, HashSet};

// Standard Okapi parameters.
const K1: f32 = 1.2;
const B: f32 = 0.75;

#[derive(Debug, Clone)]
struct SparseDoc {
    unit: ParentUnit,
    length: usize,
    term_freq: HashMap<String, usize>,
}

/// BM25 index over parent units
#[derive(Debug, Clone, Default)]
pub struct SparseIndex {
    docs: Vec<SparseDoc>,
    doc_freq: HashMap<String, usize>,
    avg_length: f32,
}

impl SparseIndex {
    /// Build the index from the complete parent unit set.
    ///
    /// Parents are sorted by id before indexing, so two builds over the
    /// same set rank identically regardless of enumeration order.
    pub fn build(parents: &[ParentUnit]) -> Self {
        let mut sorted: Vec<&ParentUnit> = parents.iter().collect();
        sorted.sort_by_key(|p| p.id);

        let mut docs = Vec::with_capacity(sorted.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_length = 0usize;

        for parent in sorted {
            let tokens = tokenize(&parent.text);
            total_length += tokens.len();

            let mut term_freq: HashMap<String, usize> = HashMap::new();
            for token in tokens.iter() {
                *term_freq.entry(token.clone()).or_default() += 1;
            }

            for term in term_freq.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }

            docs.push(SparseDoc {
                unit: parent.clone(),
                length: tokens.len(),
                term_freq,
            });
        }

        let avg_length =
            if docs.is_empty() { 0.0 } else { total_length as f32 / docs.len() as f32 };

        tracing::debug!(parents = docs.len(), terms = doc_freq.len(), "Built sparse index");

        Self { docs, doc_freq, avg_length }
    }

    /// Rank parents against `query`, descending by BM25 score.
    ///
    /// Only parents sharing at least one term with the query are returned.
    /// Ties keep id order, so results are deterministic for a fixed build.
    pub fn search(&self, query: &str, k: usize) -> Vec<(ParentUnit, f32)> {
        if self.docs.is_empty() {
            return Vec::new();
        }

        let query_terms: Vec<String> = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let n = self.docs.len() as f32;

        let mut scored: Vec<(ParentUnit, f32)> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let mut score = 0.0f32;
                for term in &query_terms {
                    let Some(&tf) = doc.term_freq.get(term) else {
                        continue;
                    };
                    let df = self.doc_freq.get(term).copied().unwrap_or(0) as f32;
                    let idf = (((n - df + 0.5) / (df + 0.5)) + 1.0).ln();
                    let tf = tf as f32;
                    let norm = K1 * (1.0 - B + B * doc.length as f32 / self.avg_length);
                    score += idf * tf * (K1 + 1.0) / (tf + norm);
                }

                if score > 0.0 {
                    Some((doc.unit.clone(), score))
                } else {
                    None
                }
            })
            .collect();

        // Stable sort: equal scores keep build (id) order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Ids of every indexed parent
    pub fn parent_ids(&self) -> HashSet<ParentId> {
        self.docs.iter().map(|d| d.unit.id).collect()
    }

    /// Number of indexed parents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the index holds no parents
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Lowercased alphanumeric tokens
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
