//! Routing outcome log
//!
//! Records one entry per completed query. A bounded sliding window feeds
//! the threshold tuner; cumulative per-mode counters feed the operator
//! status surface. In-memory only.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use serde::Serialize;
use strum::IntoEnumIterator;

use arbiter_core::{Mode, RoutingOutcome};

#[derive(Debug, Default)]
struct ModeTotals {
    count: u64,
    escalated: u64,
    ambiguous: u64,
    latency_ms_sum: u64,
    confidence_sum: f64,
    feedback_sum: f64,
    feedback_count: u64,
}

/// Aggregate view of one mode's outcomes since startup
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModeAggregate {
    pub count: u64,
    pub escalation_rate: f64,
    pub ambiguity_rate: f64,
    pub mean_latency_ms: f64,
    pub mean_confidence: f64,
    /// Mean reported satisfaction, when any feedback has arrived
    pub mean_feedback: Option<f64>,
}

/// Sliding-window log of routing outcomes
pub struct OutcomeLog {
    window: Mutex<VecDeque<RoutingOutcome>>,
    capacity: usize,
    totals: DashMap<Mode, ModeTotals>,
}

impl OutcomeLog {
    /// Create a log retaining at most `capacity` outcomes in the window
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            totals: DashMap::new(),
        }
    }

    /// Record a completed query
    pub fn record(&self, outcome: RoutingOutcome) {
        {
            let mut totals = self.totals.entry(outcome.mode).or_default();
            totals.count += 1;
            totals.escalated += u64::from(outcome.escalated);
            totals.ambiguous += u64::from(outcome.ambiguous);
            totals.latency_ms_sum += outcome.latency_ms;
            totals.confidence_sum += outcome.confidence;
            if let Some(feedback) = outcome.user_feedback {
                totals.feedback_sum += feedback;
                totals.feedback_count += 1;
            }
        }

        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        if window.len() >= self.capacity {
            window.pop_front();
        }
        window.push_back(outcome);
    }

    /// Attach a post-hoc satisfaction score to the most recent outcome
    ///
    /// Returns false when the window is empty. A repeated report replaces
    /// the previous score.
    pub fn attach_feedback(&self, feedback: f64) -> bool {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(outcome) = window.back_mut() else {
            return false;
        };

        let previous = outcome.user_feedback.replace(feedback);
        let mode = outcome.mode;
        drop(window);

        let mut totals = self.totals.entry(mode).or_default();
        match previous {
            Some(old) => totals.feedback_sum += feedback - old,
            None => {
                totals.feedback_sum += feedback;
                totals.feedback_count += 1;
            }
        }
        true
    }

    /// Number of outcomes currently in the window
    pub fn len(&self) -> usize {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the window holds no outcomes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the current window, oldest-first
    pub fn snapshot(&self) -> Vec<RoutingOutcome> {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Cumulative aggregate for one mode, if it has seen traffic
    pub fn aggregate(&self, mode: Mode) -> Option<ModeAggregate> {
        let totals = self.totals.get(&mode)?;
        if totals.count == 0 {
            return None;
        }

        let count = totals.count as f64;
        Some(ModeAggregate {
            count: totals.count,
            escalation_rate: totals.escalated as f64 / count,
            ambiguity_rate: totals.ambiguous as f64 / count,
            mean_latency_ms: totals.latency_ms_sum as f64 / count,
            mean_confidence: totals.confidence_sum / count,
            mean_feedback: (totals.feedback_count > 0)
                .then(|| totals.feedback_sum / totals.feedback_count as f64),
        })
    }

    /// Aggregates for every mode that has seen traffic
    pub fn aggregates(&self) -> Vec<(Mode, ModeAggregate)> {
        Mode::iter()
            .filter_map(|mode| self.aggregate(mode).map(|aggregate| (mode, aggregate)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(mode: Mode, confidence: f64, escalated: bool) -> RoutingOutcome {
        RoutingOutcome {
            mode,
            complexity_score: 0.5,
            confidence,
            escalated,
            ambiguous: false,
            latency_ms: 100,
            user_feedback: None,
        }
    }

    #[test]
    fn window_evicts_oldest() {
        let log = OutcomeLog::new(3);
        for confidence in [0.1, 0.2, 0.3, 0.4] {
            log.record(outcome(Mode::Fast, confidence, false));
        }

        let window = log.snapshot();
        assert_eq!(window.len(), 3);
        assert!((window[0].confidence - 0.2).abs() < f64::EPSILON);
        assert!((window[2].confidence - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregates_split_by_mode() {
        let log = OutcomeLog::new(10);
        log.record(outcome(Mode::Fast, 0.8, false));
        log.record(outcome(Mode::Fast, 0.2, true));
        log.record(outcome(Mode::Deep, 0.9, false));

        let fast = log.aggregate(Mode::Fast).unwrap();
        assert_eq!(fast.count, 2);
        assert!((fast.escalation_rate - 0.5).abs() < f64::EPSILON);
        assert!((fast.mean_confidence - 0.5).abs() < f64::EPSILON);

        let deep = log.aggregate(Mode::Deep).unwrap();
        assert_eq!(deep.count, 1);
        assert!(log.aggregate(Mode::Balanced).is_none());
    }

    #[test]
    fn feedback_attaches_to_latest_outcome() {
        let log = OutcomeLog::new(10);
        assert!(!log.attach_feedback(0.9));

        log.record(outcome(Mode::Fast, 0.8, false));
        assert!(log.attach_feedback(0.6));

        let window = log.snapshot();
        assert_eq!(window[0].user_feedback, Some(0.6));

        let aggregate = log.aggregate(Mode::Fast).unwrap();
        assert_eq!(aggregate.mean_feedback, Some(0.6));
    }

    #[test]
    fn repeated_feedback_replaces_previous_score() {
        let log = OutcomeLog::new(10);
        log.record(outcome(Mode::Fast, 0.8, false));

        log.attach_feedback(0.2);
        log.attach_feedback(0.8);

        let aggregate = log.aggregate(Mode::Fast).unwrap();
        assert_eq!(aggregate.mean_feedback, Some(0.8));
    }
}
