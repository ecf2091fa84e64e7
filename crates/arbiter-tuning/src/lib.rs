//! Feedback-driven threshold tuning
//!
//! Periodically aggregates the routing outcome window, compares the
//! observed mode distribution to target bands, and nudges the live
//! complexity thresholds toward them. Applies are validated and
//! reversible: the previous set is retained and a post-apply regression
//! rolls back to it exactly.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod analysis;
pub mod recommend;
mod snapshot;
mod tuner;

pub use analysis::{ModeStats, PerformanceAnalysis, analyze};
pub use recommend::{ThresholdRecommendation, recommend};
pub use snapshot::ThresholdSnapshot;
pub use tuner::{ThresholdTuner, TuningAction, TuningResult};
