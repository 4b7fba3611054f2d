//! LabelMatch Core Library
//!
//! On-device engine that decides whether a pharmaceutical batch record
//! is present in noisy OCR text photographed off a medicine label.
//!
//! # Architecture
//!
//! ```text
//! Camera → OCR Extraction → Normalization ──┐
//!                                           │
//!              Session batch list ──────────┤
//!                                           ▼
//!                               ┌───────────────────────┐
//!                               │     Match Engine      │
//!                               │ identifier similarity │
//!                               │ expiry format search  │
//!                               │ two-tier safety policy│
//!                               └───────────┬───────────┘
//!                          ┌────────────────┴────────────────┐
//!                          ▼                                 ▼
//!                   exact matches                     nearest matches
//!               (auto-confirmation UI)             (human disambiguation)
//! ```
//!
//! # Core Principle
//!
//! **A batch is never auto-confirmed on identifier similarity alone.**
//! The exact tier requires the declared expiry date to be independently
//! found in the capture; everything else goes to a human.
//!
//! # Modules
//!
//! - [`matcher`]: normalizer, similarity cache, identifier and expiry
//!   matchers, and the classifying engine
//! - [`models`]: domain types (BatchRecord, MatchResult, MatchOutcome)

pub mod matcher;
pub mod models;

// Re-export commonly used types
pub use matcher::{
    normalize, MatchConfig, MatchEngine, MatchError, NormalizedText, SimilarityCache,
};
pub use models::{BatchRecord, MatchOutcome, MatchResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum LabelMatchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<matcher::MatchError> for LabelMatchError {
    fn from(e: matcher::MatchError) -> Self {
        LabelMatchError::InvalidConfiguration(e.to_string())
    }
}

impl From<serde_json::Error> for LabelMatchError {
    fn from(e: serde_json::Error) -> Self {
        LabelMatchError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create an engine with caller-supplied thresholds.
#[uniffi::export]
pub fn new_engine(
    identifier_threshold: f64,
    nearest_floor: f64,
) -> Result<Arc<LabelMatchCore>, LabelMatchError> {
    let engine = MatchEngine::new(MatchConfig {
        identifier_threshold,
        nearest_floor,
    })?;
    Ok(Arc::new(LabelMatchCore { engine }))
}

/// Create an engine with the default thresholds.
#[uniffi::export]
pub fn new_engine_with_defaults() -> Arc<LabelMatchCore> {
    Arc::new(LabelMatchCore {
        engine: MatchEngine::with_defaults(),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Engine wrapper for FFI. The engine is internally synchronized
/// (cache mutexes only), so the host may share one instance freely.
#[derive(uniffi::Object)]
pub struct LabelMatchCore {
    engine: MatchEngine,
}

#[uniffi::export]
impl LabelMatchCore {
    /// Match candidate batches against one OCR capture.
    pub fn classify_batches(
        &self,
        batches: Vec<FfiBatchRecord>,
        extracted_text: String,
    ) -> FfiMatchOutcome {
        let batches: Vec<BatchRecord> = batches.into_iter().map(|b| b.into()).collect();
        self.engine.classify(&batches, &extracted_text).into()
    }

    /// Match and serialize the outcome for the rendering layer.
    pub fn classify_batches_json(
        &self,
        batches: Vec<FfiBatchRecord>,
        extracted_text: String,
    ) -> Result<String, LabelMatchError> {
        let batches: Vec<BatchRecord> = batches.into_iter().map(|b| b.into()).collect();
        let outcome = self.engine.classify(&batches, &extracted_text);
        Ok(outcome.to_json()?)
    }

    /// Drop all memoized state (camera re-init, low-memory signal).
    pub fn reset_caches(&self) {
        self.engine.reset();
    }

    /// Current cache sizes, for host-side diagnostics.
    pub fn cache_stats(&self) -> FfiCacheStats {
        FfiCacheStats {
            similarity_entries: self.engine.cache().similarity_entries() as u32,
            format_entries: self.engine.cache().format_entries() as u32,
        }
    }

    /// Configured exact-tier threshold.
    pub fn identifier_threshold(&self) -> f64 {
        self.engine.config().identifier_threshold
    }

    /// Configured nearest-tier floor.
    pub fn nearest_floor(&self) -> f64 {
        self.engine.config().nearest_floor
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe batch record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBatchRecord {
    pub identifier: String,
    pub expiry_date: Option<String>,
}

impl From<FfiBatchRecord> for BatchRecord {
    fn from(record: FfiBatchRecord) -> Self {
        BatchRecord {
            identifier: record.identifier,
            expiry_date: record.expiry_date,
        }
    }
}

impl From<BatchRecord> for FfiBatchRecord {
    fn from(record: BatchRecord) -> Self {
        Self {
            identifier: record.identifier,
            expiry_date: record.expiry_date,
        }
    }
}

/// FFI-safe match result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMatchResult {
    pub batch: FfiBatchRecord,
    pub similarity: f64,
    pub expiry_valid: bool,
}

impl From<MatchResult> for FfiMatchResult {
    fn from(result: MatchResult) -> Self {
        Self {
            batch: result.batch.into(),
            similarity: result.similarity,
            expiry_valid: result.expiry_valid,
        }
    }
}

/// FFI-safe matching outcome. The tiers are mutually exclusive.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMatchOutcome {
    pub exact: Vec<FfiMatchResult>,
    pub nearest: Vec<FfiMatchResult>,
}

impl From<MatchOutcome> for FfiMatchOutcome {
    fn from(outcome: MatchOutcome) -> Self {
        Self {
            exact: outcome.exact.into_iter().map(|r| r.into()).collect(),
            nearest: outcome.nearest.into_iter().map(|r| r.into()).collect(),
        }
    }
}

/// FFI-safe cache statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCacheStats {
    pub similarity_entries: u32,
    pub format_entries: u32,
}
