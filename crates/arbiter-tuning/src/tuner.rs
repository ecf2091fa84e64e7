//! Threshold tuner
//!
//! Owns the shared threshold snapshot and the tuning history. Every
//! apply validates the proposed set first; an invalid proposal is
//! rejected and the previous set stays live. The previous set is
//! retained so a post-apply regression can be rolled back exactly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use arbiter_config::TuningConfig;
use arbiter_core::{RoutingOutcome, ThresholdError, ThresholdSet};

use crate::analysis::{PerformanceAnalysis, analyze};
use crate::recommend::{ThresholdRecommendation, recommend};
use crate::snapshot::ThresholdSnapshot;

/// Tuning results retained for the operator surface
const HISTORY_CAPACITY: usize = 64;

/// What happened to one tuning proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningAction {
    /// Proposal validated and swapped in
    Applied,
    /// Proposal validated but not swapped in
    DryRun,
    /// Proposal violated a threshold invariant; previous set kept
    Rejected,
    /// A regression restored the previous set
    RolledBack,
    /// An operator installed a set by hand
    ManualOverride,
}

/// One entry in the tuning history
#[derive(Debug, Clone, Serialize)]
pub struct TuningResult {
    pub action: TuningAction,
    pub previous: ThresholdSet,
    pub proposed: ThresholdSet,
    pub reason: String,
}

/// Feedback-driven threshold tuner
pub struct ThresholdTuner {
    config: TuningConfig,
    thresholds: Arc<ThresholdSnapshot>,
    /// Set that was live before the most recent apply, for rollback
    rollback_set: Mutex<Option<ThresholdSet>>,
    history: Mutex<VecDeque<TuningResult>>,
    last_analysis: Mutex<Option<PerformanceAnalysis>>,
    auto_enabled: AtomicBool,
}

impl ThresholdTuner {
    /// Create a tuner sharing the given threshold snapshot
    pub fn new(config: TuningConfig, thresholds: Arc<ThresholdSnapshot>) -> Self {
        let auto_enabled = config.enabled;
        Self {
            config,
            thresholds,
            rollback_set: Mutex::new(None),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            last_analysis: Mutex::new(None),
            auto_enabled: AtomicBool::new(auto_enabled),
        }
    }

    /// Aggregate the outcome window; None below `min_samples`
    ///
    /// The analysis is retained for the operator status surface.
    pub fn analyze_performance(&self, window: &[RoutingOutcome]) -> Option<PerformanceAnalysis> {
        let analysis = analyze(window, self.config.min_samples)?;
        *self.last_analysis.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(analysis.clone());
        Some(analysis)
    }

    /// Recommend a nudged set, or None when distribution is on target
    pub fn recommend_thresholds(
        &self,
        analysis: &PerformanceAnalysis,
    ) -> Option<ThresholdRecommendation> {
        recommend(analysis, &self.thresholds.load(), &self.config)
    }

    /// Validate and (unless `dry_run`) atomically apply a recommendation
    pub fn apply_thresholds(
        &self,
        recommendation: &ThresholdRecommendation,
        dry_run: bool,
    ) -> TuningResult {
        let previous = *self.thresholds.load();
        let proposed = recommendation.proposed;

        let result = if let Err(violation) = proposed.validate() {
            tracing::warn!(%violation, "rejecting threshold recommendation");
            TuningResult {
                action: TuningAction::Rejected,
                previous,
                proposed,
                reason: violation.to_string(),
            }
        } else if dry_run {
            tracing::info!(
                confidence = recommendation.confidence,
                "dry run, thresholds unchanged"
            );
            TuningResult {
                action: TuningAction::DryRun,
                previous,
                proposed,
                reason: recommendation.reasons.join("; "),
            }
        } else {
            *self.rollback_set.lock().unwrap_or_else(PoisonError::into_inner) = Some(previous);
            self.thresholds.store(proposed);
            tracing::info!(
                complexity_simple = proposed.complexity_simple,
                complexity_complex = proposed.complexity_complex,
                confidence = recommendation.confidence,
                "applied tuned thresholds"
            );
            TuningResult {
                action: TuningAction::Applied,
                previous,
                proposed,
                reason: recommendation.reasons.join("; "),
            }
        };

        self.push_history(result.clone());
        result
    }

    /// Whether the window after an apply regressed against the one before
    ///
    /// Latency or satisfaction moving past the configured margin counts
    /// as a regression.
    pub fn check_regression(
        &self,
        before: &PerformanceAnalysis,
        after: &PerformanceAnalysis,
    ) -> bool {
        let margin = self.config.regression_margin;

        let latency_before = before.mean_latency_ms();
        let latency_after = after.mean_latency_ms();
        if latency_before > 0.0 && (latency_after - latency_before) / latency_before > margin {
            tracing::warn!(latency_before, latency_after, "latency regression detected");
            return true;
        }

        if let (Some(feedback_before), Some(feedback_after)) =
            (before.mean_feedback(), after.mean_feedback())
        {
            if feedback_before - feedback_after > margin {
                tracing::warn!(feedback_before, feedback_after, "feedback regression detected");
                return true;
            }
        }

        false
    }

    /// Restore the set that was live before the last apply
    ///
    /// Returns the restored set, or None when nothing was applied.
    pub fn rollback(&self) -> Option<ThresholdSet> {
        let restored =
            self.rollback_set.lock().unwrap_or_else(PoisonError::into_inner).take()?;
        let abandoned = *self.thresholds.load();
        self.thresholds.store(restored);

        tracing::warn!(
            complexity_simple = restored.complexity_simple,
            complexity_complex = restored.complexity_complex,
            "rolled back tuned thresholds"
        );
        self.push_history(TuningResult {
            action: TuningAction::RolledBack,
            previous: abandoned,
            proposed: restored,
            reason: "regression after apply".to_owned(),
        });
        Some(restored)
    }

    /// Install a set by hand, disabling auto-tuning until re-enabled
    pub fn set_manual(&self, set: ThresholdSet) -> Result<(), ThresholdError> {
        set.validate()?;

        let previous = *self.thresholds.load();
        self.thresholds.store(set);
        self.auto_enabled.store(false, Ordering::Relaxed);
        *self.rollback_set.lock().unwrap_or_else(PoisonError::into_inner) = None;

        tracing::info!("manual threshold override installed, auto-tuning disabled");
        self.push_history(TuningResult {
            action: TuningAction::ManualOverride,
            previous,
            proposed: set,
            reason: "manual override".to_owned(),
        });
        Ok(())
    }

    /// Re-enable auto-tuning after a manual override
    pub fn enable_auto(&self) {
        self.auto_enabled.store(true, Ordering::Relaxed);
    }

    /// Whether the tuner may apply recommendations automatically
    pub fn auto_enabled(&self) -> bool {
        self.auto_enabled.load(Ordering::Relaxed)
    }

    /// Current live threshold set
    pub fn current(&self) -> Arc<ThresholdSet> {
        self.thresholds.load()
    }

    /// Most recent analysis, for the operator status surface
    pub fn last_analysis(&self) -> Option<PerformanceAnalysis> {
        self.last_analysis.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recent tuning results, oldest first
    pub fn history(&self) -> Vec<TuningResult> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn push_history(&self, result: TuningResult) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() >= HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(result);
    }
}

#[cfg(test)]
mod tests {
    use arbiter_core::Mode;

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

    fn skewed_window(fast: usize, balanced: usize, deep: usize) -> Vec<RoutingOutcome> {
        let mut window = Vec::new();
        window.extend((0..fast).map(|_| outcome(Mode::Fast, 150, None)));
        window.extend((0..balanced).map(|_| outcome(Mode::Balanced, 600, None)));
        window.extend((0..deep).map(|_| outcome(Mode::Deep, 2_500, None)));
        window
    }

    fn tuner() -> ThresholdTuner {
        let config = TuningConfig {
            enabled: true,
            min_samples: 10,
            ..TuningConfig::default()
        };
        ThresholdTuner::new(config, Arc::new(ThresholdSnapshot::new(ThresholdSet::default())))
    }

    #[test]
    fn apply_swaps_and_records_history() {
        let tuner = tuner();
        let analysis = tuner.analyze_performance(&skewed_window(10, 65, 25)).unwrap();
        let rec = tuner.recommend_thresholds(&analysis).unwrap();

        let result = tuner.apply_thresholds(&rec, false);
        assert_eq!(result.action, TuningAction::Applied);
        assert!((tuner.current().complexity_simple - 0.32).abs() < 1e-9);

        let history = tuner.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, TuningAction::Applied);
    }

    #[test]
    fn dry_run_leaves_thresholds_untouched() {
        let tuner = tuner();
        let analysis = tuner.analyze_performance(&skewed_window(10, 65, 25)).unwrap();
        let rec = tuner.recommend_thresholds(&analysis).unwrap();

        let result = tuner.apply_thresholds(&rec, true);
        assert_eq!(result.action, TuningAction::DryRun);
        assert!((tuner.current().complexity_simple - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_proposal_is_rejected_and_previous_kept() {
        let tuner = tuner();
        let rec = ThresholdRecommendation {
            proposed: ThresholdSet {
                complexity_simple: 0.8,
                complexity_complex: 0.5,
                ..ThresholdSet::default()
            },
            confidence: 0.9,
            reasons: vec!["bad".to_owned()],
        };

        let result = tuner.apply_thresholds(&rec, false);
        assert_eq!(result.action, TuningAction::Rejected);
        assert!((tuner.current().complexity_simple - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn rollback_restores_previous_set_exactly() {
        let tuner = tuner();
        let analysis = tuner.analyze_performance(&skewed_window(10, 65, 25)).unwrap();
        let rec = tuner.recommend_thresholds(&analysis).unwrap();
        tuner.apply_thresholds(&rec, false);

        let restored = tuner.rollback().unwrap();
        assert_eq!(restored, ThresholdSet::default());
        assert_eq!(*tuner.current(), ThresholdSet::default());
        assert_eq!(tuner.history().last().unwrap().action, TuningAction::RolledBack);

        // Nothing left to roll back to.
        assert!(tuner.rollback().is_none());
    }

    #[test]
    fn regression_detected_on_latency_increase() {
        let tuner = tuner();
        let before = analyze(&skewed_window(50, 30, 20), 1).unwrap();
        let after = analyze(&skewed_window(10, 30, 60), 1).unwrap();

        assert!(tuner.check_regression(&before, &after));
        assert!(!tuner.check_regression(&before, &before));
    }

    #[test]
    fn regression_detected_on_feedback_drop() {
        let tuner = tuner();
        let good: Vec<RoutingOutcome> =
            (0..20).map(|_| outcome(Mode::Fast, 150, Some(0.9))).collect();
        let bad: Vec<RoutingOutcome> =
            (0..20).map(|_| outcome(Mode::Fast, 150, Some(0.5))).collect();

        let before = analyze(&good, 1).unwrap();
        let after = analyze(&bad, 1).unwrap();
        assert!(tuner.check_regression(&before, &after));
    }

    #[test]
    fn manual_override_disables_auto_tuning() {
        let tuner = tuner();
        assert!(tuner.auto_enabled());

        let manual = ThresholdSet {
            complexity_simple: 0.25,
            ..ThresholdSet::default()
        };
        tuner.set_manual(manual).unwrap();

        assert!(!tuner.auto_enabled());
        assert!((tuner.current().complexity_simple - 0.25).abs() < f64::EPSILON);
        assert_eq!(tuner.history().last().unwrap().action, TuningAction::ManualOverride);

        tuner.enable_auto();
        assert!(tuner.auto_enabled());
    }

    #[test]
    fn invalid_manual_override_is_refused() {
        let tuner = tuner();
        let invalid = ThresholdSet {
            confidence_low: 0.9,
            confidence_high: 0.5,
            ..ThresholdSet::default()
        };
        assert!(tuner.set_manual(invalid).is_err());
        assert_eq!(*tuner.current(), ThresholdSet::default());
    }

    #[test]
    fn thin_window_produces_no_analysis() {
        let tuner = tuner();
        assert!(tuner.analyze_performance(&skewed_window(2, 2, 2)).is_none());
        assert!(tuner.last_analysis().is_none());
    }

    #[test]
    fn history_is_bounded() {
        let tuner = tuner();
        let rec = ThresholdRecommendation {
            proposed: ThresholdSet {
                complexity_simple: 0.32,
                ..ThresholdSet::default()
            },
            confidence: 0.5,
            reasons: vec!["nudge".to_owned()],
        };

        for _ in 0..(HISTORY_CAPACITY + 10) {
            tuner.apply_thresholds(&rec, true);
        }
        assert_eq!(tuner.history().len(), HISTORY_CAPACITY);
    }
}
