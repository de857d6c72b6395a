//! Candidate ranking
//!
//! Scores a query against every candidate tag/title with one of the composite
//! scorers, then filters, sorts and tiers the results.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::similarity::{compute_score, compute_text_match_score};

/// Which composite scorer to rank with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scorer {
    /// Whole-string similarity, for comparable labels
    General,
    /// Substring-friendly, for search-as-you-type
    #[default]
    #[serde(alias = "text-match", alias = "textmatch")]
    Text,
}

impl Scorer {
    pub fn score(self, query: &str, candidate: &str) -> f64 {
        match self {
            Scorer::General => compute_score(query, candidate),
            Scorer::Text => compute_text_match_score(query, candidate),
        }
    }
}

/// Confidence tier for a ranked match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

/// Score thresholds for confidence tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Score >= this is HIGH confidence
    pub high: f64,
    /// Score >= this (but < high) is MEDIUM confidence
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.6,
        }
    }
}

impl ConfidenceThresholds {
    pub fn classify(&self, score: f64) -> Confidence {
        if score >= self.high {
            Confidence::High
        } else if score >= self.medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Options for `rank_candidates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankOptions {
    pub scorer: Scorer,
    /// Maximum results to return, 0 for no limit
    pub limit: usize,
    /// Matches scoring below this are dropped
    pub min_score: f64,
    /// Candidates are cut to this many chars before scoring
    pub max_candidate_chars: Option<usize>,
    pub thresholds: ConfidenceThresholds,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            scorer: Scorer::default(),
            limit: 10,
            min_score: 0.3,
            max_candidate_chars: Some(128),
            thresholds: ConfidenceThresholds::default(),
        }
    }
}

/// A candidate with its score and confidence tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub candidate: String,
    pub score: f64,
    pub confidence: Confidence,
}

fn truncate_chars(s: &str, max: Option<usize>) -> &str {
    match max {
        Some(n) => match s.char_indices().nth(n) {
            Some((idx, _)) => &s[..idx],
            None => s,
        },
        None => s,
    }
}

/// Descending score, then candidate text; input position plays no part
fn by_score_desc(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate.cmp(&b.candidate))
}

/// Rank `candidates` against `query`, best first.
pub fn rank_candidates<S>(query: &str, candidates: &[S], opts: &RankOptions) -> Vec<RankedMatch>
where
    S: AsRef<str> + Sync,
{
    let mut matches: Vec<RankedMatch> = candidates
        .par_iter()
        .filter_map(|c| {
            let candidate = c.as_ref();
            let score = opts
                .scorer
                .score(query, truncate_chars(candidate, opts.max_candidate_chars));
            if score < opts.min_score {
                return None;
            }
            Some(RankedMatch {
                candidate: candidate.to_string(),
                score,
                confidence: opts.thresholds.classify(score),
            })
        })
        .collect();

    matches.sort_by(by_score_desc);

    if opts.limit > 0 {
        matches.truncate(opts.limit);
    }

    debug!(
        "Ranked {} of {} candidates for {:?}",
        matches.len(),
        candidates.len(),
        query
    );

    matches
}

/// Highest-scoring candidate, or `None` when there are no candidates
pub fn best_match<S>(query: &str, candidates: &[S], scorer: Scorer) -> Option<RankedMatch>
where
    S: AsRef<str> + Sync,
{
    let opts = RankOptions {
        scorer,
        limit: 1,
        min_score: 0.0,
        max_candidate_chars: None,
        ..RankOptions::default()
    };
    rank_candidates(query, candidates, &opts).into_iter().next()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> Vec<&'static str> {
        vec!["cat_ears", "category", "dog", "catgirl", "long_hair", "cat"]
    }

    #[test]
    fn test_rank_orders_by_score() {
        let opts = RankOptions {
            min_score: 0.0,
            limit: 0,
            ..RankOptions::default()
        };
        let ranked = rank_candidates("cat", &tags(), &opts);
        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].candidate, "cat");
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[0].confidence, Confidence::High);
        assert_eq!(ranked.last().map(|m| m.candidate.as_str()), Some("dog"));
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_rank_filters_and_limits() {
        let opts = RankOptions {
            min_score: 0.5,
            limit: 2,
            ..RankOptions::default()
        };
        let ranked = rank_candidates("cat", &tags(), &opts);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|m| m.score >= 0.5));
        assert!(ranked.iter().all(|m| m.candidate != "dog"));
    }

    #[test]
    fn test_rank_ties_are_alphabetical() {
        let candidates = vec!["b", "a", "c"];
        let opts = RankOptions {
            min_score: 0.0,
            limit: 0,
            scorer: Scorer::General,
            ..RankOptions::default()
        };
        // All three score identically against an unrelated query
        let ranked = rank_candidates("z", &candidates, &opts);
        let names: Vec<&str> = ranked.iter().map(|m| m.candidate.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_ignores_input_order() {
        let opts = RankOptions {
            min_score: 0.0,
            limit: 0,
            ..RankOptions::default()
        };
        let forward = vec!["cat_tail", "cat_ears", "dog", "cats", "bat"];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            rank_candidates("cat", &forward, &opts),
            rank_candidates("cat", &backward, &opts)
        );
    }

    #[test]
    fn test_truncation_keeps_original_candidate() {
        let long = format!("cat{}", "x".repeat(500));
        let opts = RankOptions {
            min_score: 0.0,
            max_candidate_chars: Some(3),
            ..RankOptions::default()
        };
        let ranked = rank_candidates("cat", &[long.clone()], &opts);
        assert_eq!(ranked[0].candidate, long);
        assert_eq!(ranked[0].score, 1.0);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("猫耳娘", Some(2)), "猫耳");
        assert_eq!(truncate_chars("ab", Some(5)), "ab");
        assert_eq!(truncate_chars("ab", None), "ab");
    }

    #[test]
    fn test_best_match() {
        let best = best_match("catgrl", &tags(), Scorer::General);
        assert_eq!(best.map(|m| m.candidate), Some("catgirl".to_string()));
        let none: Option<RankedMatch> = best_match("cat", &Vec::<String>::new(), Scorer::Text);
        assert!(none.is_none());
    }

    #[test]
    fn test_confidence_levels() {
        let t = ConfidenceThresholds::default();
        assert_eq!(t.classify(0.9), Confidence::High);
        assert_eq!(t.classify(0.85), Confidence::High);
        assert_eq!(t.classify(0.7), Confidence::Medium);
        assert_eq!(t.classify(0.1), Confidence::Low);
        assert_eq!(Confidence::Medium.as_str(), "MEDIUM");
    }

    #[test]
    fn test_scorer_serde_names() {
        let s: Scorer = serde_json::from_str("\"general\"").unwrap();
        assert_eq!(s, Scorer::General);
        let t: Scorer = serde_json::from_str("\"text-match\"").unwrap();
        assert_eq!(t, Scorer::Text);
    }
}
