//! Escalation decision for speculative results
//!
//! A speculative answer is accepted, accepted with an ambiguity flag, or
//! escalated to a deeper profile based on where its confidence falls
//! relative to the live thresholds. The decision is monotone in
//! confidence and DEEP is terminal.

use arbiter_config::EscalationTarget;
use arbiter_core::{Mode, ThresholdSet};

/// What to do with a speculative result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Confidence at or above the high threshold
    Accept,
    /// Confidence in the medium band; served as-is but flagged for the tuner
    AcceptAmbiguous,
    /// Confidence below the low threshold
    Escalate,
}

/// Decide whether a result with the given confidence is served or escalated
pub fn decide(confidence: f64, thresholds: &ThresholdSet) -> Decision {
    if confidence >= thresholds.confidence_high {
        Decision::Accept
    } else if confidence < thresholds.confidence_low {
        Decision::Escalate
    } else {
        Decision::AcceptAmbiguous
    }
}

/// The mode an escalated query re-runs at, if any
///
/// Escalating from BALANCED always goes to DEEP regardless of the
/// configured target; DEEP results are terminal.
pub const fn escalation_mode(current: Mode, target: EscalationTarget) -> Option<Mode> {
    match current {
        Mode::Deep => None,
        Mode::Balanced => Some(Mode::Deep),
        Mode::Fast => Some(match target {
            EscalationTarget::Balanced => Mode::Balanced,
            EscalationTarget::Deep => Mode::Deep,
        }),
    }
}
