//! Complexity classification and routing decisions
//!
//! Decides how much effort a query deserves: a heuristic classifier
//! maps queries to modes under live thresholds, a profile registry
//! scopes each mode's resource budget, and the escalation module grades
//! speculative results. Completed queries land in the outcome log that
//! feeds the threshold tuner.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod classify;
pub mod escalate;
mod error;
pub mod outcome;
pub mod profiles;

pub use classify::{classify, map_to_mode};
pub use error::RoutingError;
pub use escalate::{Decision, decide, escalation_mode};
pub use outcome::{ModeAggregate, OutcomeLog};
pub use profiles::{ModeProfile, ModeProfileRegistry};
