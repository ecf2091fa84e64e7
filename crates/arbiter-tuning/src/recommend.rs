//! Threshold recommendation
//!
//! Compares the observed mode distribution against the configured target
//! bands and nudges the complexity thresholds one step toward them.
//! Raising `complexity_simple` sends more traffic FAST; lowering
//! `complexity_complex` sends more traffic DEEP.

use serde::Serialize;

use arbiter_config::TuningConfig;
use arbiter_core::{Mode, ThresholdSet};

use crate::analysis::PerformanceAnalysis;

/// A proposed threshold set plus the evidence behind it
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdRecommendation {
    pub proposed: ThresholdSet,
    /// How sure the tuner is, from sample size and imbalance magnitude
    pub confidence: f64,
    /// Human-readable nudge descriptions for the history log
    pub reasons: Vec<String>,
}

/// Recommend a nudged threshold set, or None when distribution is on target
pub fn recommend(
    analysis: &PerformanceAnalysis,
    current: &ThresholdSet,
    config: &TuningConfig,
) -> Option<ThresholdRecommendation> {
    let targets = &config.targets;
    let step = config.step;

    let fast_share = analysis.share(Mode::Fast);
    let deep_share = analysis.share(Mode::Deep);

    let mut proposed = *current;
    let mut reasons = Vec::new();
    let mut imbalance = 0.0f64;

    if fast_share < targets.fast_min {
        proposed.complexity_simple = clamp(current.complexity_simple + step, config);
        imbalance = imbalance.max(targets.fast_min - fast_share);
        reasons.push(format!(
            "fast share {fast_share:.2} below target {:.2}, raising complexity_simple",
            targets.fast_min
        ));
    } else if fast_share > targets.fast_max {
        proposed.complexity_simple = clamp(current.complexity_simple - step, config);
        imbalance = imbalance.max(fast_share - targets.fast_max);
        reasons.push(format!(
            "fast share {fast_share:.2} above target {:.2}, lowering complexity_simple",
            targets.fast_max
        ));
    }

    if deep_share < targets.deep_min {
        proposed.complexity_complex = clamp(current.complexity_complex - step, config);
        imbalance = imbalance.max(targets.deep_min - deep_share);
        reasons.push(format!(
            "deep share {deep_share:.2} below target {:.2}, lowering complexity_complex",
            targets.deep_min
        ));
    } else if deep_share > targets.deep_max {
        proposed.complexity_complex = clamp(current.complexity_complex + step, config);
        imbalance = imbalance.max(deep_share - targets.deep_max);
        reasons.push(format!(
            "deep share {deep_share:.2} above target {:.2}, raising complexity_complex",
            targets.deep_max
        ));
    }

    if reasons.is_empty() || proposed == *current {
        return None;
    }

    // More samples and a larger imbalance both justify more conviction.
    let sample_factor =
        (analysis.sample_count as f64 / (4.0 * config.min_samples.max(1) as f64)).min(1.0);
    let imbalance_factor = (imbalance / 0.2).min(1.0);
    let confidence = (0.5 * sample_factor + 0.5 * imbalance_factor).clamp(0.0, 1.0);

    Some(ThresholdRecommendation {
        proposed,
        confidence,
        reasons,
    })
}

fn clamp(value: f64, config: &TuningConfig) -> f64 {
    value.clamp(config.complexity_min, config.complexity_max)
}
