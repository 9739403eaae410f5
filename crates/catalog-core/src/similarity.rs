//! Pinned similarity scorer backing the merge threshold.
//!
//! Merge correctness is tuned against this exact function, so the
//! algorithm is fixed here rather than left to a matching library's
//! default: normalized Levenshtein over the whitespace-stripped canonical
//! titles. Stripping spaces first means word-split variants of the same
//! name ("dandadan" vs "dan da dan") score 1.0.

use strsim::normalized_levenshtein;

/// Scores two canonical (already-normalized) titles in [0, 1].
/// Symmetric and deterministic.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: String = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: String = b.chars().filter(|c| !c.is_whitespace()).collect();
    normalized_levenshtein(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn test_word_split_variants_score_as_identical() {
        let a = normalize("Dandadan");
        let b = normalize("Dan Da Dan");
        assert!(similarity(&a, &b) >= 0.95);
    }

    #[test]
    fn test_distinct_titles_score_low() {
        let a = normalize("Dandadan");
        let b = normalize("One Piece");
        assert!(similarity(&a, &b) < 0.95);
    }

    #[test]
    fn test_symmetric() {
        let (a, b) = ("frieren", "frieren beyond journeys end");
        assert_eq!(similarity(a, b), similarity(b, a));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(similarity("dandadan", "dandadan"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        let score = similarity("abc", "xyz");
        assert!((0.0..=1.0).contains(&score));
    }
}
