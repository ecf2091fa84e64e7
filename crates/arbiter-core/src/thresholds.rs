//! Routing threshold set and its invariants
//!
//! A `ThresholdSet` is an immutable snapshot: the tuner swaps whole sets
//! atomically rather than mutating fields in place, so concurrent readers
//! never observe a partially-updated set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Violations of the threshold ordering invariants
#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    /// A threshold fell outside the open interval (0, 1)
    #[error("threshold {name} must be in (0, 1), got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// complexity_simple must stay below complexity_complex
    #[error("complexity_simple ({simple}) must be < complexity_complex ({complex})")]
    ComplexityOrdering { simple: f64, complex: f64 },

    /// confidence_low must stay below confidence_high
    #[error("confidence_low ({low}) must be < confidence_high ({high})")]
    ConfidenceOrdering { low: f64, high: f64 },
}

/// The four live routing thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Complexity below this routes FAST
    pub complexity_simple: f64,
    /// Complexity above this routes DEEP
    pub complexity_complex: f64,
    /// Confidence at or above this accepts the speculative result
    pub confidence_high: f64,
    /// Confidence below this escalates to deep retrieval
    pub confidence_low: f64,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            complexity_simple: 0.3,
            complexity_complex: 0.7,
            confidence_high: 0.75,
            confidence_low: 0.4,
        }
    }
}

impl ThresholdSet {
    /// Check the ordering and range invariants
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("complexity_simple", self.complexity_simple),
            ("complexity_complex", self.complexity_complex),
            ("confidence_high", self.confidence_high),
            ("confidence_low", self.confidence_low),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }

        if self.complexity_simple >= self.complexity_complex {
            return Err(ThresholdError::ComplexityOrdering {
                simple: self.complexity_simple,
                complex: self.complexity_complex,
            });
        }

        if self.confidence_low >= self.confidence_high {
            return Err(ThresholdError::ConfidenceOrdering {
                low: self.confidence_low,
                high: self.confidence_high,
            });
        }

        Ok(())
    }
}
