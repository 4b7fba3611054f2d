//! Batch records and match results.

use serde::{Deserialize, Serialize};

/// One candidate batch from the session's batch list.
///
/// The caller populates `identifier` explicitly; records with an empty
/// identifier are skipped by the engine. `expiry_date` is free-form,
/// exactly as the upstream system supplies it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchRecord {
    /// Batch/lot number printed on the label. Primary matching key.
    pub identifier: String,
    /// Declared expiry date, not pre-normalized.
    pub expiry_date: Option<String>,
}

impl BatchRecord {
    /// Create a record without a declared expiry.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            expiry_date: None,
        }
    }

    /// Create a record with a declared expiry.
    pub fn with_expiry(identifier: impl Into<String>, expiry: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            expiry_date: Some(expiry.into()),
        }
    }

    /// The identifier with surrounding whitespace removed, or `None`
    /// if nothing usable remains.
    pub fn trimmed_identifier(&self) -> Option<&str> {
        let trimmed = self.identifier.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// The declared expiry, or `None` when absent or blank.
    pub fn declared_expiry(&self) -> Option<&str> {
        let trimmed = self.expiry_date.as_deref()?.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// One scored batch from a matching pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    /// The candidate batch this result refers to.
    pub batch: BatchRecord,
    /// Identifier similarity in [0, 1].
    pub similarity: f64,
    /// Whether the declared expiry was found in the capture (vacuously
    /// true when no expiry is declared).
    pub expiry_valid: bool,
}

/// Outcome of one matching pass. The tiers are mutually exclusive:
/// when `exact` is non-empty, `nearest` is empty, and vice versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchOutcome {
    /// Fully verified matches, similarity descending. Safe for
    /// automatic confirmation by the host.
    pub exact: Vec<MatchResult>,
    /// Unverified candidates (at most two), similarity descending.
    /// Require human disambiguation.
    pub nearest: Vec<MatchResult>,
}

impl MatchOutcome {
    /// No batch matched at either tier.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.nearest.is_empty()
    }

    /// The best fully verified match, if any.
    pub fn confirmed(&self) -> Option<&MatchResult> {
        self.exact.first()
    }

    /// Whether the host must present a disambiguation choice.
    pub fn needs_review(&self) -> bool {
        !self.nearest.is_empty()
    }

    /// Serialize for the rendering collaborator.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
