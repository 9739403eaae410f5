//! Canonical title form used as the dedup key.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Reduces a raw title to its canonical comparable form: NFKD-decompose
/// and drop combining marks, lowercase, collapse every run of whitespace
/// and punctuation into one space, trim.
///
/// Deterministic, total, idempotent. Never shown to users; the first-seen
/// raw title is what gets displayed.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_space = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("Dãndadãn"), normalize("Dandadan"));
        assert_eq!(normalize("Pokémon"), "pokemon");
    }

    #[test]
    fn test_lowercases_and_collapses_separators() {
        assert_eq!(normalize("  One   Piece!! "), "one piece");
        assert_eq!(normalize("Re:Zero - Starting Life"), "re zero starting life");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["Dãndadãn", "  A --- B  ", "ダンダダン", "Frieren: Beyond Journey's End"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_punctuation_only_title_collapses_to_empty() {
        assert_eq!(normalize("?!?"), "");
    }
}
