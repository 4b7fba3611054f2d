//! Identifier similarity scoring.
//!
//! Tiered strategies, first success wins:
//! 1. Exact token or substring hit → 1.0
//! 2. Word-level fuzzy scan with early exit
//! 3. Bounded sliding window over the raw character stream
//!
//! Scores are `1 − levenshtein / max(len)` in [0, 1], computed through
//! `strsim::normalized_levenshtein` (rolling-row edit distance). A
//! length-gap quick-reject runs before any edit-distance work.

use strsim::normalized_levenshtein;

use super::normalizer::NormalizedText;

/// Stop scanning once a candidate scores at least this.
pub(crate) const EARLY_EXIT_SIMILARITY: f64 = 0.95;

/// Words whose char length differs from the identifier's by more than
/// this are skipped in the word scan.
const WORD_LENGTH_SLACK: usize = 3;

/// Sliding-window scan only runs for identifiers up to this length.
const WINDOW_SCAN_MAX_LEN: usize = 6;

/// Window advance per step.
const WINDOW_STRIDE: usize = 2;

/// Pairs whose length gap exceeds this fraction of the longer string
/// score 0.0 without running Levenshtein.
const LENGTH_GAP_REJECT: f64 = 0.5;

/// Best-effort similarity between a batch identifier and one capture.
///
/// `identifier` must already be trimmed and uppercased (the engine
/// normalizes it before calling). Returns a score in [0, 1].
pub fn identifier_similarity(identifier: &str, text: &NormalizedText) -> f64 {
    if identifier.is_empty() || text.is_empty() {
        return 0.0;
    }

    // Tier 1: exact presence. The token set is O(1); the substring
    // check covers identifiers glued to punctuation or neighbors.
    if text.word_set.contains(identifier) || text.text.contains(identifier) {
        return 1.0;
    }

    let id_len = identifier.chars().count();

    // Tier 2: fuzzy scan over whole words.
    let mut best: f64 = 0.0;
    for word in &text.words {
        if word.chars().count().abs_diff(id_len) > WORD_LENGTH_SLACK {
            continue;
        }
        best = best.max(pair_similarity(identifier, word));
        if best >= EARLY_EXIT_SIMILARITY {
            return best;
        }
    }

    // Tier 3: sliding window, short identifiers only. Catches codes
    // that OCR split or merged across token boundaries. Stride 2
    // halves the work; the fuzzy score tolerates the off-by-one.
    if id_len <= WINDOW_SCAN_MAX_LEN {
        let chars: Vec<char> = text.text.chars().collect();
        let mut start = 0;
        while start + id_len <= chars.len() {
            let window: String = chars[start..start + id_len].iter().collect();
            best = best.max(pair_similarity(identifier, &window));
            if best >= EARLY_EXIT_SIMILARITY {
                return best;
            }
            start += WINDOW_STRIDE;
        }
    }

    best
}

/// Normalized Levenshtein similarity for one candidate pair.
///
/// `sim(x, x) == 1.0` for non-empty `x`, `sim(x, "") == 0.0`, and the
/// score is symmetric.
pub fn pair_similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let gap = len_a.abs_diff(len_b) as f64 / len_a.max(len_b) as f64;
    if gap > LENGTH_GAP_REJECT {
        return 0.0;
    }

    normalized_levenshtein(a, b).clamp(0.0, 1.0)
}
