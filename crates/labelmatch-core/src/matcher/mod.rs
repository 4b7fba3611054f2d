//! Batch-text matching engine.
//!
//! Pipeline: Normalization → Identifier Similarity → Expiry Presence → Classification
//!
//! Safety policy: a batch is only auto-confirmable ("exact") when its
//! identifier clears the similarity threshold AND its declared expiry
//! date is independently found in the capture. Everything else lands in
//! the "nearest" tier for mandatory human disambiguation, and the two
//! tiers are never returned together.

mod cache;
mod expiry;
mod identifier;
mod normalizer;

pub use cache::SimilarityCache;
pub use expiry::{expiry_candidates, is_present, parse_expiry};
pub use identifier::{identifier_similarity, pair_similarity};
pub use normalizer::{normalize, NormalizedText};

use thiserror::Error;

use crate::models::{BatchRecord, MatchOutcome, MatchResult};

/// Nearest-tier results surfaced to the operator.
const MAX_NEAREST_MATCHES: usize = 2;

/// Default identifier similarity required for the exact tier.
pub const DEFAULT_IDENTIFIER_THRESHOLD: f64 = 0.80;

/// Default floor below which a batch is not even a nearest candidate.
pub const DEFAULT_NEAREST_FLOOR: f64 = 0.60;

/// Engine configuration errors.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Identifier threshold out of range [0, 1]: {0}")]
    ThresholdOutOfRange(f64),

    #[error("Nearest-match floor out of range [0, 1]: {0}")]
    FloorOutOfRange(f64),
}

pub type MatchEngineResult<T> = Result<T, MatchError>;

/// Thresholds supplied by the caller. Both knobs are configuration,
/// not engine invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// Minimum identifier similarity for the exact tier.
    pub identifier_threshold: f64,
    /// Minimum identifier similarity to appear as a nearest candidate.
    pub nearest_floor: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            identifier_threshold: DEFAULT_IDENTIFIER_THRESHOLD,
            nearest_floor: DEFAULT_NEAREST_FLOOR,
        }
    }
}

impl MatchConfig {
    fn validate(&self) -> MatchEngineResult<()> {
        if !(0.0..=1.0).contains(&self.identifier_threshold) {
            return Err(MatchError::ThresholdOutOfRange(self.identifier_threshold));
        }
        if !(0.0..=1.0).contains(&self.nearest_floor) {
            return Err(MatchError::FloorOutOfRange(self.nearest_floor));
        }
        Ok(())
    }
}

/// The matching engine. Owns its caches; holds no other state between
/// calls, so classification is reproducible with caches cleared.
pub struct MatchEngine {
    config: MatchConfig,
    cache: SimilarityCache,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl MatchEngine {
    /// Create an engine with validated thresholds.
    pub fn new(config: MatchConfig) -> MatchEngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: SimilarityCache::new(),
        })
    }

    /// Create an engine with the default thresholds.
    pub fn with_defaults() -> Self {
        Self {
            config: MatchConfig::default(),
            cache: SimilarityCache::new(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }

    /// Clear all memoized state. Invoked by the host on camera re-init
    /// or low-memory signals.
    pub fn reset(&self) {
        self.cache.clear();
    }

    /// Match every candidate batch against one OCR capture.
    ///
    /// Returns either exact matches (identifier AND expiry verified,
    /// sorted by similarity descending) or up to two nearest matches
    /// for human review — never both.
    pub fn classify(&self, batches: &[BatchRecord], extracted_text: &str) -> MatchOutcome {
        let normalized = normalize(extracted_text);
        let fingerprint = SimilarityCache::text_fingerprint(&normalized.text);
        // Expiry search runs over the un-normalized capture; only the
        // case is folded so punctuation stays intact.
        let raw_upper = extracted_text.to_uppercase();

        let mut exact: Vec<MatchResult> = Vec::new();
        let mut nearest: Vec<MatchResult> = Vec::new();

        for batch in batches {
            let Some(identifier) = batch.trimmed_identifier() else {
                continue;
            };
            let identifier = identifier.to_uppercase();

            let similarity = self.memoized_similarity(&identifier, &fingerprint, &normalized);

            if similarity >= self.config.identifier_threshold {
                let expiry_valid = match batch.declared_expiry() {
                    Some(expiry) => self.expiry_present(expiry, &raw_upper),
                    None => true,
                };
                let result = MatchResult {
                    batch: batch.clone(),
                    similarity,
                    expiry_valid,
                };
                if expiry_valid {
                    exact.push(result);
                } else {
                    nearest.push(result);
                }
            } else if similarity >= self.config.nearest_floor {
                nearest.push(MatchResult {
                    batch: batch.clone(),
                    similarity,
                    expiry_valid: false,
                });
            }
        }

        if !exact.is_empty() {
            sort_by_similarity(&mut exact);
            return MatchOutcome {
                exact,
                nearest: Vec::new(),
            };
        }

        sort_by_similarity(&mut nearest);
        nearest.truncate(MAX_NEAREST_MATCHES);
        MatchOutcome {
            exact: Vec::new(),
            nearest,
        }
    }

    fn memoized_similarity(
        &self,
        identifier: &str,
        fingerprint: &str,
        normalized: &NormalizedText,
    ) -> f64 {
        if let Some(hit) = self.cache.similarity(identifier, fingerprint) {
            return hit;
        }
        let similarity = identifier_similarity(identifier, normalized);
        self.cache.store_similarity(identifier, fingerprint, similarity);
        similarity
    }

    fn expiry_present(&self, expiry: &str, raw_upper: &str) -> bool {
        let key = expiry.trim();
        let candidates = match self.cache.formats(key) {
            Some(hit) => hit,
            None => self.cache.store_formats(key, expiry_candidates(expiry)),
        };
        is_present(&candidates, raw_upper)
    }
}

/// Sort results by similarity, best first.
fn sort_by_similarity(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(identifier: &str, expiry: Option<&str>) -> BatchRecord {
        BatchRecord {
            identifier: identifier.into(),
            expiry_date: expiry.map(|e| e.into()),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(MatchEngine::new(MatchConfig::default()).is_ok());
        assert!(matches!(
            MatchEngine::new(MatchConfig {
                identifier_threshold: 1.5,
                nearest_floor: 0.6
            }),
            Err(MatchError::ThresholdOutOfRange(_))
        ));
        assert!(matches!(
            MatchEngine::new(MatchConfig {
                identifier_threshold: 0.8,
                nearest_floor: -0.1
            }),
            Err(MatchError::FloorOutOfRange(_))
        ));
    }

    #[test]
    fn test_exact_match_with_expiry() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("AB1234", Some("2026-03-31"))];

        let outcome = engine.classify(&batches, "BATCH AB1234 EXP 03/31/2026");

        assert_eq!(outcome.exact.len(), 1);
        assert!(outcome.nearest.is_empty());
        assert_eq!(outcome.exact[0].similarity, 1.0);
        assert!(outcome.exact[0].expiry_valid);
    }

    #[test]
    fn test_identifier_hit_without_expiry_is_nearest() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("AB1234", Some("2026-03-31"))];

        let outcome = engine.classify(&batches, "BATCH AB1234 no date printed");

        assert!(outcome.exact.is_empty());
        assert_eq!(outcome.nearest.len(), 1);
        assert_eq!(outcome.nearest[0].similarity, 1.0);
        assert!(!outcome.nearest[0].expiry_valid);
    }

    #[test]
    fn test_no_declared_expiry_is_vacuously_valid() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("AB1234", None), batch("CD5678", Some("  "))];

        let outcome = engine.classify(&batches, "AB1234 CD5678");

        assert_eq!(outcome.exact.len(), 2);
        assert!(outcome.exact.iter().all(|r| r.expiry_valid));
    }

    #[test]
    fn test_near_miss_goes_to_nearest_tier() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("AB1234", Some("2026-03-31"))];

        let outcome = engine.classify(&batches, "AB1239 random text");

        assert!(outcome.exact.is_empty());
        assert_eq!(outcome.nearest.len(), 1);
        let result = &outcome.nearest[0];
        assert!((result.similarity - 5.0 / 6.0).abs() < 1e-9);
        assert!(!result.expiry_valid);
    }

    #[test]
    fn test_below_floor_is_dropped() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("AB1234", None)];

        let outcome = engine.classify(&batches, "nothing relevant whatsoever");

        assert!(outcome.exact.is_empty());
        assert!(outcome.nearest.is_empty());
    }

    #[test]
    fn test_empty_identifier_skipped() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("", None), batch("   ", Some("2026-03-31"))];

        let outcome = engine.classify(&batches, "BATCH AB1234 EXP 03/31/2026");

        assert!(outcome.exact.is_empty());
        assert!(outcome.nearest.is_empty());
    }

    #[test]
    fn test_empty_batch_list() {
        let engine = MatchEngine::with_defaults();
        let outcome = engine.classify(&[], "BATCH AB1234");
        assert!(outcome.exact.is_empty());
        assert!(outcome.nearest.is_empty());
    }

    #[test]
    fn test_exact_tier_discards_nearest() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![
            batch("AB1234", Some("2026-03-31")),
            // Near the capture's identifier but never verifiable
            batch("AB1235", Some("2030-01-01")),
        ];

        let outcome = engine.classify(&batches, "AB1234 EXP 31/03/2026");

        assert_eq!(outcome.exact.len(), 1);
        assert_eq!(outcome.exact[0].batch.identifier, "AB1234");
        assert!(outcome.nearest.is_empty());
    }

    #[test]
    fn test_nearest_sorted_and_truncated() {
        let engine = MatchEngine::with_defaults();
        // All one edit or two away from the capture, none with the
        // printed expiry — three nearest candidates compete for two slots.
        let batches = vec![
            batch("AB1211", None),
            batch("AB1239", Some("2030-01-01")),
            batch("AB1235", Some("2030-01-01")),
        ];

        let outcome = engine.classify(&batches, "AB1234 EXP 01/2026");

        assert!(outcome.exact.is_empty() || outcome.nearest.is_empty());
        assert!(outcome.nearest.len() <= MAX_NEAREST_MATCHES);
        for pair in outcome.nearest.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_lowercase_batch_identifier_matches() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("ab1234", None)];

        let outcome = engine.classify(&batches, "batch AB1234");

        assert_eq!(outcome.exact.len(), 1);
        assert_eq!(outcome.exact[0].similarity, 1.0);
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = MatchEngine::new(MatchConfig {
            identifier_threshold: 0.75,
            nearest_floor: 0.5,
        })
        .unwrap();
        let batches = vec![batch("AB1234", None)];

        // 5/6 ≈ 0.83 clears a 0.75 threshold; no expiry declared.
        let outcome = engine.classify(&batches, "AB1239");
        assert_eq!(outcome.exact.len(), 1);
    }

    #[test]
    fn test_results_identical_after_reset() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![batch("AB1234", Some("2026-03-31"))];
        let text = "BATCH AB1234 EXP 03/31/2026";

        let first = engine.classify(&batches, text);
        assert!(engine.cache().similarity_entries() > 0);

        engine.reset();
        assert_eq!(engine.cache().similarity_entries(), 0);
        assert_eq!(engine.cache().format_entries(), 0);

        let second = engine.classify(&batches, text);
        assert_eq!(first.exact.len(), second.exact.len());
        assert_eq!(first.exact[0].similarity, second.exact[0].similarity);
    }

    #[test]
    fn test_cache_populated_by_classify() {
        let engine = MatchEngine::with_defaults();
        let batches = vec![
            batch("AB1234", Some("2026-03-31")),
            batch("CD5678", Some("2027-06-30")),
        ];

        engine.classify(&batches, "BATCH AB1234 EXP 03/31/2026");

        assert_eq!(engine.cache().similarity_entries(), 2);
        // Only AB1234 cleared the threshold, so only its expiry set was generated.
        assert_eq!(engine.cache().format_entries(), 1);
    }
}
