//! Keyword-overlap relevance ranking.
//!
//! A memory's score is the number of query tokens that occur anywhere in its
//! lower-cased text. Tokens are not de-duplicated and matching is plain
//! substring containment, so "art" hits "smart" and a repeated query word
//! counts once per repetition.

use serde::{Deserialize, Serialize};

use crate::record::MemoryRecord;

/// Number of memories returned when the caller has no preference.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// A memory that matched a query, with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredMemory {
    pub memory: String,
    pub score: usize,
    pub timestamp: String,
}

/// Lower-case `query` and split it on whitespace.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Count how many of `tokens` appear in `text` (case-insensitive).
pub fn score(tokens: &[String], text: &str) -> usize {
    let text = text.to_lowercase();
    tokens.iter().filter(|t| text.contains(t.as_str())).count()
}

/// Score `memories` against `query`, drop non-matches, and return the best
/// `limit` in descending score order. Equal scores keep insertion order.
pub fn rank(query: &str, memories: &[MemoryRecord], limit: usize) -> Vec<ScoredMemory> {
    let tokens = tokenize(query);
    if tokens.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredMemory> = memories
        .iter()
        .filter_map(|m| {
            let s = score(&tokens, &m.memory);
            (s > 0).then(|| ScoredMemory {
                memory: m.memory.clone(),
                score: s,
                timestamp: m.timestamp.clone(),
            })
        })
        .collect();

    // `sort_by` is stable, which keeps ties in insertion order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}
