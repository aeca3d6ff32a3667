//! Text-similarity scoring used by store searches.

use crate::model::MemoryValue;
use std::collections::HashSet;

/// Recall options for ranked searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryRecallOptions {
    /// Optional minimum score filter; scores of zero never match.
    pub min_score: Option<f32>,
}

impl MemoryRecallOptions {
    /// Whether a score passes the configured threshold.
    pub fn accepts(&self, score: f32) -> bool {
        score > 0.0 && self.min_score.is_none_or(|min| score >= min)
    }
}

/// Split text into lowercase alphanumeric terms of two or more characters.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| term.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

/// Score a value against a query as the share of query terms it contains.
///
/// Content and context both contribute terms. The result is in `[0, 1]`.
pub fn similarity(query: &str, value: &MemoryValue) -> f32 {
    let query_terms = tokenize(query);
    if query_terms.is_empty() {
        return 0.0;
    }
    let mut document = tokenize(&value.content);
    document.extend(tokenize(&value.context));
    let hits = query_terms
        .iter()
        .filter(|term| document.contains(*term))
        .count();
    hits as f32 / query_terms.len() as f32
}
