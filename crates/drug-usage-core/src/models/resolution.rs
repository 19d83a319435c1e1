//! Query resolution models for the name resolver.

use serde::{Deserialize, Serialize};

/// How a query term was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ResolutionMethod {
    /// Input equals a canonical name
    Exact,
    /// Input equals a known alias of the canonical name
    Alias { alias: String },
    /// Input approximately matched a canonical name or alias
    Fuzzy { matched: String, score: f64 },
    /// Nothing cleared the threshold; the normalized input is searched literally
    Literal,
}

/// Canonical query term produced by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedQuery {
    /// Term used for filtering. Never empty.
    pub term: String,
    /// Input as typed, present only when approximate matching changed it
    pub original: Option<String>,
    /// How the term was produced
    pub method: ResolutionMethod,
}

impl ResolvedQuery {
    /// Whether the term was corrected by approximate matching.
    pub fn was_corrected(&self) -> bool {
        self.original.is_some()
    }
}

/// A fuzzy-match candidate with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    /// Canonical name the candidate resolves to
    pub canonical: String,
    /// The canonical name or alias that was compared
    pub matched: String,
    /// Similarity score (0.0 - 1.0)
    pub score: f64,
    /// Length in characters of the prefix shared with the input
    pub common_prefix: usize,
}
