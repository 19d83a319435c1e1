//! Approximate matching of query text against alias table candidates.
//!
//! Ranking rules, applied in order:
//! - Higher normalized Levenshtein similarity
//! - Longer common prefix with the input
//! - Earlier candidate (canonical names in table order, each followed by its aliases)

use std::cmp::Ordering;

use strsim::normalized_levenshtein;

use crate::models::ScoredCandidate;

use super::AliasTable;

/// Minimum similarity for a fuzzy match to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.70;

/// Fuzzy matcher over an alias table.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl Matcher {
    /// Create a matcher with the given acceptance threshold.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best candidate that clears the threshold.
    pub fn best_match(&self, normalized: &str, table: &AliasTable) -> Option<ScoredCandidate> {
        let mut best: Option<ScoredCandidate> = None;
        for candidate in self.scored(normalized, table) {
            let replace = match &best {
                None => true,
                Some(current) => rank(&candidate, current) == Ordering::Less,
            };
            if replace {
                best = Some(candidate);
            }
        }
        best
    }

    /// All candidates that clear the threshold, best first.
    pub fn ranked(&self, normalized: &str, table: &AliasTable) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = self.scored(normalized, table).collect();
        // Stable sort keeps table order for full ties
        scored.sort_by(rank);
        scored
    }

    fn scored<'t>(
        &self,
        normalized: &'t str,
        table: &'t AliasTable,
    ) -> impl Iterator<Item = ScoredCandidate> + 't {
        let threshold = self.threshold;
        table
            .candidates()
            .map(move |(candidate, canonical)| {
                let lower = candidate.to_lowercase();
                ScoredCandidate {
                    canonical: canonical.to_string(),
                    matched: candidate.to_string(),
                    score: similarity(normalized, &lower),
                    common_prefix: common_prefix_len(normalized, &lower),
                }
            })
            .filter(move |c| c.score >= threshold)
    }
}

/// Ordering where `Less` means `a` ranks ahead of `b`.
fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.common_prefix.cmp(&a.common_prefix))
}

/// Character-level similarity in [0.0, 1.0].
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Number of leading characters two strings share.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        let mut table = AliasTable::new();
        table.insert("ibuprofen", ["布洛芬", "advil", "motrin"]);
        table.insert("metformin", ["glucophage"]);
        table
    }

    #[test]
    fn test_similarity() {
        assert!(similarity("ibuprofen", "ibuprofen") > 0.99);
        assert!(similarity("ibuprofn", "ibuprofen") > 0.85);
        assert!(similarity("ibuprofen", "metformin") < 0.5);
        assert!(similarity("布洛分", "布洛芬") > 0.6);
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len("ibuprofn", "ibuprofen"), 7);
        assert_eq!(common_prefix_len("abc", "xbc"), 0);
        assert_eq!(common_prefix_len("布洛", "布洛芬"), 2);
    }

    #[test]
    fn test_best_match_typo() {
        let best = Matcher::default().best_match("ibuprofn", &table()).unwrap();
        assert_eq!(best.canonical, "ibuprofen");
        assert_eq!(best.matched, "ibuprofen");
    }

    #[test]
    fn test_best_match_alias_typo() {
        let best = Matcher::default().best_match("glucophag", &table()).unwrap();
        assert_eq!(best.canonical, "metformin");
        assert_eq!(best.matched, "glucophage");
    }

    #[test]
    fn test_below_threshold() {
        assert!(Matcher::default().best_match("warfarin", &table()).is_none());
    }

    #[test]
    fn test_tie_broken_by_common_prefix() {
        let mut table = AliasTable::new();
        // Both are one substitution away from "abcd"
        table.insert("aacd", Vec::<String>::new());
        table.insert("abcx", Vec::<String>::new());

        let best = Matcher::new(0.5).best_match("abcd", &table).unwrap();
        assert_eq!(best.canonical, "abcx");
    }

    #[test]
    fn test_full_tie_keeps_table_order() {
        let mut table = AliasTable::new();
        table.insert("abxd", Vec::<String>::new());
        table.insert("abyd", Vec::<String>::new());

        let matcher = Matcher::new(0.5);
        assert_eq!(matcher.best_match("abcd", &table).unwrap().canonical, "abxd");

        let ranked = matcher.ranked("abcd", &table);
        let names: Vec<_> = ranked.iter().map(|c| c.canonical.as_str()).collect();
        assert_eq!(names, vec!["abxd", "abyd"]);
    }

    #[test]
    fn test_ranked_is_sorted() {
        let ranked = Matcher::new(0.3).ranked("ibuprofn", &table());
        assert!(!ranked.is_empty());
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked[0].canonical, "ibuprofen");
    }
}
