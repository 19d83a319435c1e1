//! Name resolver for free-text ingredient queries.
//!
//! Pipeline: Normalization → Exact/Alias Lookup → Fuzzy Match → Literal Fallback

mod alias;
mod matcher;

pub use alias::*;
pub use matcher::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ResolutionMethod, ResolvedQuery, ScoredCandidate};

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Match threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum similarity (0.0 - 1.0) for a fuzzy correction
    pub match_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> ResolverResult<()> {
        if self.match_threshold > 0.0 && self.match_threshold <= 1.0 {
            Ok(())
        } else {
            Err(ResolverError::InvalidThreshold(self.match_threshold))
        }
    }
}

/// Trim and lower-case query text for comparison.
pub fn normalize_query(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Resolves query text to a canonical term using an alias table.
#[derive(Debug, Clone)]
pub struct Resolver {
    aliases: AliasTable,
    matcher: Matcher,
}

impl Resolver {
    /// Create a resolver with the default threshold.
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            aliases,
            matcher: Matcher::default(),
        }
    }

    /// Create a resolver with explicit configuration.
    pub fn with_config(aliases: AliasTable, config: ResolverConfig) -> ResolverResult<Self> {
        config.validate()?;
        Ok(Self {
            aliases,
            matcher: Matcher::new(config.match_threshold),
        })
    }

    /// Resolve query text to a canonical term.
    ///
    /// Only empty input is an error; unknown input falls back to a literal search term.
    pub fn resolve(&self, input: &str) -> ResolverResult<ResolvedQuery> {
        let normalized = normalize_query(input);
        if normalized.is_empty() {
            return Err(ResolverError::EmptyQuery);
        }

        // Step 1: exact canonical name or alias
        if let Some(hit) = self.aliases.lookup(&normalized) {
            let resolved = match hit {
                AliasHit::Canonical(canonical) => ResolvedQuery {
                    term: canonical.to_string(),
                    original: None,
                    method: ResolutionMethod::Exact,
                },
                AliasHit::Alias { canonical, alias } => ResolvedQuery {
                    term: canonical.to_string(),
                    original: None,
                    method: ResolutionMethod::Alias {
                        alias: alias.to_string(),
                    },
                },
            };
            tracing::debug!(input, term = %resolved.term, "resolved by exact lookup");
            return Ok(resolved);
        }

        // Step 2: approximate match
        if let Some(best) = self.matcher.best_match(&normalized, &self.aliases) {
            tracing::debug!(
                input,
                term = %best.canonical,
                matched = %best.matched,
                score = best.score,
                "resolved by fuzzy match"
            );
            return Ok(ResolvedQuery {
                term: best.canonical,
                original: Some(input.trim().to_string()),
                method: ResolutionMethod::Fuzzy {
                    matched: best.matched,
                    score: best.score,
                },
            });
        }

        // Step 3: literal fallback
        tracing::debug!(input, term = %normalized, "no match above threshold, searching literally");
        Ok(ResolvedQuery {
            term: normalized,
            original: None,
            method: ResolutionMethod::Literal,
        })
    }

    /// Ranked "did you mean" suggestions, one per canonical name.
    pub fn candidates(&self, input: &str, limit: usize) -> Vec<ScoredCandidate> {
        let normalized = normalize_query(input);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut seen = std::collections::HashSet::new();
        self.matcher
            .ranked(&normalized, &self.aliases)
            .into_iter()
            .filter(|c| seen.insert(c.canonical.clone()))
            .take(limit)
            .collect()
    }

    /// Get the alias table for direct access.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Get the matcher for direct access.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(AliasTable::builtin())
    }
}
