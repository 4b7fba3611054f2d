//! Session-scoped memoization for the matching engine.
//!
//! Two maps: identifier-vs-text similarity scores, and generated
//! expiry-format sets. Entries are pure derived data — classification
//! must produce identical results with the cache empty, so eviction or
//! `clear()` is always safe. The cache is owned by the engine instance;
//! there is no process-wide state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};

/// Memoization store for one engine instance.
///
/// Similarity entries are keyed by `(identifier, text fingerprint)`;
/// the fingerprint is a SHA-256 digest of the normalized text so a
/// large OCR capture is hashed once per `classify` call instead of
/// being cloned into every map key.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    similarity: Mutex<HashMap<(String, String), f64>>,
    formats: Mutex<HashMap<String, Arc<Vec<String>>>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex fingerprint of a text body, used as the similarity map key.
    pub fn text_fingerprint(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }

    /// Look up a memoized similarity score.
    pub fn similarity(&self, identifier: &str, fingerprint: &str) -> Option<f64> {
        lock(&self.similarity)
            .get(&(identifier.to_string(), fingerprint.to_string()))
            .copied()
    }

    /// Memoize a similarity score.
    pub fn store_similarity(&self, identifier: &str, fingerprint: &str, value: f64) {
        lock(&self.similarity).insert((identifier.to_string(), fingerprint.to_string()), value);
    }

    /// Look up the generated format set for an expiry string.
    pub fn formats(&self, expiry: &str) -> Option<Arc<Vec<String>>> {
        lock(&self.formats).get(expiry).cloned()
    }

    /// Memoize a generated format set, returning the shared handle.
    pub fn store_formats(&self, expiry: &str, formats: Vec<String>) -> Arc<Vec<String>> {
        let shared = Arc::new(formats);
        lock(&self.formats).insert(expiry.to_string(), Arc::clone(&shared));
        shared
    }

    /// Drop every entry. Exposed to the host for camera re-init and
    /// low-memory signals.
    pub fn clear(&self) {
        lock(&self.similarity).clear();
        lock(&self.formats).clear();
    }

    /// Number of memoized similarity scores.
    pub fn similarity_entries(&self) -> usize {
        lock(&self.similarity).len()
    }

    /// Number of memoized format sets.
    pub fn format_entries(&self) -> usize {
        lock(&self.formats).len()
    }
}

/// Lock a cache map, recovering from poisoning. A panic mid-insert can
/// at worst leave a stale derived value, which recomputation corrects.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
