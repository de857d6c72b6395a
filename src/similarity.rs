//! Approximate string matching
//!
//! Edit distance, partial ratio and the two composite scores used to rank tag
//! and title candidates against a search query.
//!
//! All lengths are counted in `char`s, so multi-byte tags (e.g. Japanese tag
//! names) are compared character by character rather than byte by byte.
//!
//! # Performance
//! - `levenshtein_distance`: O(n*m) time, O(min(n, m)) space
//! - `partial_ratio`: O((L-S+1) * S^2); callers should bound candidate length

// ============================================================================
// Scoring Weights
// ============================================================================

/// Weights for `compute_score` (similar-sized labels, near-duplicate detection)
struct GeneralWeights {
    /// Share of whole-string similarity in the blend
    full: f64,
    /// Share of partial ratio in the blend
    partial: f64,
    /// Subtracted when the first characters differ
    first_char_penalty: f64,
    /// Length difference at which the length penalty kicks in
    len_diff_threshold: usize,
    /// Scaled by len_diff / max_len
    len_diff_penalty: f64,
    /// Added per character of common prefix
    prefix_bonus: f64,
    /// Added when one string contains the other
    containment_bonus: f64,
}

const GENERAL: GeneralWeights = GeneralWeights {
    full: 0.85,
    partial: 0.15,
    first_char_penalty: 0.05,
    len_diff_threshold: 3,
    len_diff_penalty: 0.05,
    prefix_bonus: 0.02,
    containment_bonus: 0.06,
};

/// Weights for `compute_text_match_score` (search-as-you-type against long tags)
struct TextMatchWeights {
    full: f64,
    partial: f64,
    len_diff_threshold: usize,
    len_diff_penalty: f64,
    prefix_bonus: f64,
    containment_bonus: f64,
}

const TEXT_MATCH: TextMatchWeights = TextMatchWeights {
    full: 0.4,
    partial: 0.6,
    len_diff_threshold: 10,
    len_diff_penalty: 0.02,
    prefix_bonus: 0.01,
    containment_bonus: 0.2,
};

// ============================================================================
// Edit Distance
// ============================================================================

/// Minimum number of single-character insertions, deletions or substitutions
/// needed to turn `s1` into `s2`.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    levenshtein_chars(&a, &b)
}

/// Wagner-Fischer over two rolling rows sized by the shorter input.
pub fn levenshtein_chars(s1: &[char], s2: &[char]) -> usize {
    if s1.is_empty() {
        return s2.len();
    }
    if s2.is_empty() {
        return s1.len();
    }

    // Rows are sized by the shorter sequence
    let (long, short) = if s2.len() > s1.len() { (s2, s1) } else { (s1, s2) };

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr: Vec<usize> = vec![0; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (k, sc) in short.iter().enumerate() {
            let cost = usize::from(lc != sc);
            curr[k + 1] = (prev[k + 1] + 1)
                .min(curr[k] + 1)
                .min(prev[k] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

// ============================================================================
// Partial Ratio
// ============================================================================

/// Best similarity of `short_s` against any window of `long_s` with the same
/// length, as `1 - distance / len(short_s)`.
///
/// An empty needle is a perfect match. When `long_s` is shorter than `short_s`
/// there is no window to compare and the result is `0.0`; the composite
/// scorers never call it that way round.
pub fn partial_ratio(short_s: &str, long_s: &str) -> f64 {
    let short: Vec<char> = short_s.chars().collect();
    let long: Vec<char> = long_s.chars().collect();
    partial_ratio_chars(&short, &long)
}

fn partial_ratio_chars(short: &[char], long: &[char]) -> f64 {
    if short.is_empty() {
        return 1.0;
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        let dist = levenshtein_chars(short, window);
        let score = 1.0 - dist as f64 / short.len() as f64;
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}

// ============================================================================
// Composite Scores
// ============================================================================

/// Pieces shared by both composite scorers
struct Signals {
    full: f64,
    partial: f64,
    max_len: usize,
    len_diff: usize,
    prefix_len: usize,
    first_char_differs: bool,
    contains: bool,
}

/// Returns `None` when the pair short-circuits to a perfect score.
fn signals(s1: &str, s2: &str) -> Option<Signals> {
    if s1 == s2 {
        return None;
    }

    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return None;
    }

    let dist = levenshtein_chars(&a, &b);
    let full = 1.0 - dist as f64 / max_len as f64;
    let partial = if a.len() < b.len() {
        partial_ratio_chars(&a, &b)
    } else {
        partial_ratio_chars(&b, &a)
    };

    let first_char_differs = match (a.first(), b.first()) {
        (Some(x), Some(y)) => x != y,
        _ => false,
    };

    Some(Signals {
        full,
        partial,
        max_len,
        len_diff: a.len().abs_diff(b.len()),
        prefix_len: common_prefix_len(&a, &b),
        first_char_differs,
        contains: s1.contains(s2) || s2.contains(s1),
    })
}

fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// General-purpose similarity in `[0, 1]`, favouring whole-string agreement.
///
/// Tuned for comparing two labels of similar size (deduplication,
/// near-duplicate detection).
pub fn compute_score(s1: &str, s2: &str) -> f64 {
    let Some(sig) = signals(s1, s2) else {
        return 1.0;
    };
    let w = &GENERAL;

    let mut score = w.full * sig.full + w.partial * sig.partial;

    if sig.first_char_differs {
        score -= w.first_char_penalty;
    }

    if sig.len_diff >= w.len_diff_threshold {
        score -= w.len_diff_penalty * sig.len_diff as f64 / sig.max_len as f64;
    }

    score += w.prefix_bonus * sig.prefix_len as f64;

    if sig.contains {
        score += w.containment_bonus;
    }

    score.clamp(0.0, 1.0)
}

/// Text-search similarity in `[0, 1]`, favouring substring hits.
///
/// Tuned for search-as-you-type, where the query is usually a fragment of a
/// longer tag.
pub fn compute_text_match_score(s1: &str, s2: &str) -> f64 {
    let Some(sig) = signals(s1, s2) else {
        return 1.0;
    };
    let w = &TEXT_MATCH;

    let mut score = w.full * sig.full + w.partial * sig.partial;

    if sig.len_diff >= w.len_diff_threshold {
        score -= w.len_diff_penalty * sig.len_diff as f64 / sig.max_len as f64;
    }

    score += w.prefix_bonus * sig.prefix_len as f64;

    if sig.contains {
        score += w.containment_bonus;
    }

    score.clamp(0.0, 1.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_levenshtein_classic() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("sitting", "kitten"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn test_levenshtein_identity() {
        assert_eq!(levenshtein_distance("hatsune_miku", "hatsune_miku"), 0);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        // Each of these is a single multi-byte char
        assert_eq!(levenshtein_distance("猫", "犬"), 1);
        assert_eq!(levenshtein_distance("猫耳", "猫"), 1);
    }

    #[test]
    fn test_partial_ratio_exact_window() {
        assert_eq!(partial_ratio("cat", "concatenate"), 1.0);
    }

    #[test]
    fn test_partial_ratio_empty_needle() {
        assert_eq!(partial_ratio("", "anything"), 1.0);
        assert_eq!(partial_ratio("", ""), 1.0);
    }

    #[test]
    fn test_partial_ratio_longer_needle_is_zero() {
        assert_eq!(partial_ratio("category", "cat"), 0.0);
    }

    #[test]
    fn test_partial_ratio_best_window() {
        // "dog" vs windows of "a_dig_b": best is "dig", one substitution
        let r = partial_ratio("dog", "a_dig_b");
        assert!((r - (1.0 - 1.0 / 3.0)).abs() < EPS);
    }

    #[test]
    fn test_scores_identity() {
        assert_eq!(compute_score("blue_hair", "blue_hair"), 1.0);
        assert_eq!(compute_text_match_score("blue_hair", "blue_hair"), 1.0);
        assert_eq!(compute_score("", ""), 1.0);
        assert_eq!(compute_text_match_score("", ""), 1.0);
    }

    #[test]
    fn test_compute_score_prefix_beats_suffix() {
        let prefix = compute_score("abcdef", "abcxyz");
        let suffix = compute_score("abcdef", "xyzabc");
        assert!((prefix - 0.56).abs() < EPS);
        assert_eq!(suffix, 0.0);
        assert!(prefix > suffix);
    }

    #[test]
    fn test_text_match_substring_ordering() {
        let hit = compute_text_match_score("cat", "category");
        let miss = compute_text_match_score("cat", "dog");
        assert!((hit - 0.98).abs() < EPS);
        assert_eq!(miss, 0.0);
    }

    #[test]
    fn test_compute_score_containment_bonus() {
        // "cat" in "cats": dist 1, full 0.75, part 1.0
        // 0.85*0.75 + 0.15 + 0.02*3 + 0.06
        let s = compute_score("cat", "cats");
        assert!((s - 0.9075).abs() < EPS);
    }

    #[test]
    fn test_compute_score_length_penalty() {
        // dist 5, max_len 8, full 0.375, part 1.0, len_diff 5
        // 0.85*0.375 + 0.15 - 0.05*5/8 + 0.06 + 0.06
        let s = compute_score("cat", "category");
        let expected = 0.85 * 0.375 + 0.15 - 0.05 * 5.0 / 8.0 + 0.06 + 0.06;
        assert!((s - expected).abs() < EPS);
    }

    #[test]
    fn test_compute_score_first_char_penalty() {
        // Same distance, one with differing first char
        let same_first = compute_score("abcd", "abce");
        let diff_first = compute_score("abcd", "xbcd");
        assert!(same_first > diff_first);
    }

    #[test]
    fn test_one_empty_side() {
        // part 1.0 (empty needle), length penalty 0.05, containment 0.06
        assert!((compute_score("", "abc") - 0.16).abs() < EPS);
        assert!((compute_text_match_score("abc", "") - 0.8).abs() < EPS);
    }

    #[test]
    fn test_deterministic() {
        let a = compute_text_match_score("long_hair", "very_long_hair");
        let b = compute_text_match_score("long_hair", "very_long_hair");
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
