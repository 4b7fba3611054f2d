//! OCR text normalizer.
//!
//! Produces the three views the identifier matcher works against:
//! the trimmed/uppercased text, its whitespace tokens in order, and a
//! set over those tokens for O(1) membership checks.

use std::collections::HashSet;

/// Normalized view of one OCR capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Trimmed, uppercased text. Punctuation is preserved.
    pub text: String,
    /// Whitespace tokens of `text`, in document order.
    pub words: Vec<String>,
    /// Set over `words` for membership tests.
    pub word_set: HashSet<String>,
}

impl NormalizedText {
    /// Whether the capture contained any usable text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Normalize raw OCR text. Pure; empty input yields empty outputs.
pub fn normalize(raw: &str) -> NormalizedText {
    let text = raw.trim().to_uppercase();
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let word_set: HashSet<String> = words.iter().cloned().collect();

    NormalizedText {
        text,
        words,
        word_set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_uppercases() {
        let norm = normalize("  batch ab1234\nexp 03/2026  ");
        assert_eq!(norm.text, "BATCH AB1234\nEXP 03/2026");
    }

    #[test]
    fn test_words_in_order() {
        let norm = normalize("Lot: XK-55 Exp 2026-01-31");
        assert_eq!(norm.words, vec!["LOT:", "XK-55", "EXP", "2026-01-31"]);
    }

    #[test]
    fn test_word_set_membership() {
        let norm = normalize("BATCH AB1234 EXP 03/31/2026");
        assert!(norm.word_set.contains("AB1234"));
        assert!(norm.word_set.contains("EXP"));
        assert!(!norm.word_set.contains("ab1234"));
    }

    #[test]
    fn test_multiline_splits_on_any_whitespace() {
        let norm = normalize("AB1234\nCD5678\tEF9012");
        assert_eq!(norm.words.len(), 3);
        assert!(norm.word_set.contains("CD5678"));
    }

    #[test]
    fn test_empty_input() {
        let norm = normalize("");
        assert!(norm.is_empty());
        assert!(norm.words.is_empty());
        assert!(norm.word_set.is_empty());

        let blank = normalize("   \n\t  ");
        assert!(blank.is_empty());
        assert!(blank.words.is_empty());
    }

    #[test]
    fn test_punctuation_preserved() {
        let norm = normalize("exp: 31.03.2026");
        assert_eq!(norm.text, "EXP: 31.03.2026");
    }
}
