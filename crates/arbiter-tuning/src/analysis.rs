//! Outcome window aggregation
//!
//! Turns the raw outcome window into the per-mode statistics the
//! recommendation step works from. Analysis never runs on fewer than
//! `min_samples` outcomes; a thin window produces noise, not signal.

use serde::Serialize;
use strum::IntoEnumIterator;

use arbiter_core::{Mode, RoutingOutcome};

/// Aggregated statistics for one mode within an analysis window
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModeStats {
    /// Outcomes routed to this mode
    pub count: usize,
    /// Fraction of the window routed to this mode
    pub share: f64,
    pub mean_latency_ms: f64,
    pub mean_confidence: f64,
    /// Mean reported satisfaction, when any feedback arrived
    pub mean_feedback: Option<f64>,
}

/// One analysis pass over the outcome window
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceAnalysis {
    pub sample_count: usize,
    /// Fraction of the window that escalated
    pub escalation_rate: f64,
    /// Fraction of the window accepted from the medium confidence band
    pub ambiguity_rate: f64,
    pub modes: Vec<(Mode, ModeStats)>,
}

impl PerformanceAnalysis {
    /// Share of the window routed to `mode` (0.0 when unseen)
    pub fn share(&self, mode: Mode) -> f64 {
        self.stats(mode).map_or(0.0, |stats| stats.share)
    }

    /// Statistics for `mode`, if it saw traffic
    pub fn stats(&self, mode: Mode) -> Option<&ModeStats> {
        self.modes.iter().find(|(m, _)| *m == mode).map(|(_, stats)| stats)
    }

    /// Mean latency across the whole window
    pub fn mean_latency_ms(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .modes
            .iter()
            .map(|(_, stats)| stats.mean_latency_ms * stats.count as f64)
            .sum();
        weighted / self.sample_count as f64
    }

    /// Mean feedback across the window, when any mode has feedback
    pub fn mean_feedback(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (_, stats) in &self.modes {
            if let Some(feedback) = stats.mean_feedback {
                sum += feedback * stats.count as f64;
                count += stats.count;
            }
        }
        (count > 0).then(|| sum / count as f64)
    }
}

/// Aggregate an outcome window, or None below `min_samples`
pub fn analyze(window: &[RoutingOutcome], min_samples: usize) -> Option<PerformanceAnalysis> {
    if window.len() < min_samples.max(1) {
        tracing::debug!(
            samples = window.len(),
            min_samples,
            "outcome window too small for analysis"
        );
        return None;
    }

    let total = window.len() as f64;
    let escalated = window.iter().filter(|outcome| outcome.escalated).count();
    let ambiguous = window.iter().filter(|outcome| outcome.ambiguous).count();

    let modes = Mode::iter()
        .filter_map(|mode| {
            let outcomes: Vec<&RoutingOutcome> =
                window.iter().filter(|outcome| outcome.mode == mode).collect();
            if outcomes.is_empty() {
                return None;
            }

            let count = outcomes.len();
            let latency_sum: u64 = outcomes.iter().map(|outcome| outcome.latency_ms).sum();
            let confidence_sum: f64 = outcomes.iter().map(|outcome| outcome.confidence).sum();
            let feedback: Vec<f64> =
                outcomes.iter().filter_map(|outcome| outcome.user_feedback).collect();

            Some((
                mode,
                ModeStats {
                    count,
                    share: count as f64 / total,
                    mean_latency_ms: latency_sum as f64 / count as f64,
                    mean_confidence: confidence_sum / count as f64,
                    mean_feedback: (!feedback.is_empty())
                        .then(|| feedback.iter().sum::<f64>() / feedback.len() as f64),
                },
            ))
        })
        .collect();

    Some(PerformanceAnalysis {
        sample_count: window.len(),
        escalation_rate: escalated as f64 / total,
        ambiguity_rate: ambiguous as f64 / total,
        modes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(mode: Mode, latency_ms: u64, feedback: Option<f64>) -> RoutingOutcome {
        RoutingOutcome {
            mode,
            complexity_score: 0.5,
            confidence: 0.8,
            escalated: false,
            ambiguous: false,
            latency_ms,
            user_feedback: feedback,
        }
    }

    #[test]
    fn below_min_samples_yields_none() {
        let window = vec![outcome(Mode::Fast, 100, None)];
        assert!(analyze(&window, 10).is_none());
    }

    #[test]
    fn shares_sum_to_one() {
        let window = vec![
            outcome(Mode::Fast, 100, None),
            outcome(Mode::Fast, 100, None),
            outcome(Mode::Balanced, 500, None),
            outcome(Mode::Deep, 2_000, None),
        ];

        let analysis = analyze(&window, 1).unwrap();
        let total: f64 = analysis.modes.iter().map(|(_, stats)| stats.share).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((analysis.share(Mode::Fast) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn per_mode_latency_and_feedback() {
        let window = vec![
            outcome(Mode::Fast, 100, Some(0.9)),
            outcome(Mode::Fast, 300, None),
            outcome(Mode::Deep, 2_000, Some(0.5)),
        ];

        let analysis = analyze(&window, 1).unwrap();
        let fast = analysis.stats(Mode::Fast).unwrap();
        assert!((fast.mean_latency_ms - 200.0).abs() < 1e-9);
        assert_eq!(fast.mean_feedback, Some(0.9));

        assert!(analysis.stats(Mode::Balanced).is_none());
        assert!((analysis.mean_latency_ms() - 800.0).abs() < 1e-9);
    }

    #[test]
    fn escalation_and_ambiguity_rates() {
        let mut escalated = outcome(Mode::Fast, 100, None);
        escalated.escalated = true;
        let mut ambiguous = outcome(Mode::Balanced, 500, None);
        ambiguous.ambiguous = true;

        let window = vec![escalated, ambiguous, outcome(Mode::Fast, 100, None), outcome(Mode::Fast, 100, None)];
        let analysis = analyze(&window, 1).unwrap();
        assert!((analysis.escalation_rate - 0.25).abs() < 1e-9);
        assert!((analysis.ambiguity_rate - 0.25).abs() < 1e-9);
    }

    #[test]
    fn window_mean_feedback_weights_by_count() {
        let window = vec![
            outcome(Mode::Fast, 100, Some(1.0)),
            outcome(Mode::Fast, 100, Some(0.5)),
            outcome(Mode::Deep, 2_000, None),
        ];

        let analysis = analyze(&window, 1).unwrap();
        assert_eq!(analysis.mean_feedback(), Some(0.75));
    }
}
