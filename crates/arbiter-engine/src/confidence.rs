//! Speculative confidence scoring
//!
//! Combines passage evidence into a single confidence in [0, 1]. Every
//! component weight comes from configuration; the score drives the
//! accept/escalate decision, so the combination must stay monotone in
//! each piece of evidence.

use arbiter_config::ConfidenceWeightsConfig;
use arbiter_core::RetrievedPassage;

/// Score a speculative result from its backing passages
///
/// `history` is the mean reported satisfaction for the mode, when any
/// feedback has arrived.
pub fn score(
    passages: &[RetrievedPassage],
    cache_hit: bool,
    history: Option<f64>,
    weights: &ConfidenceWeightsConfig,
) -> f64 {
    let best = passages
        .iter()
        .map(|passage| f64::from(passage.score))
        .fold(0.0f64, f64::max);
    let mean = if passages.is_empty() {
        0.0
    } else {
        passages.iter().map(|passage| f64::from(passage.score)).sum::<f64>()
            / passages.len() as f64
    };

    score_from_parts(best, mean, passages.len(), cache_hit, history, weights)
}

/// Score from pre-computed evidence components
///
/// The deep path ranks passages by fused reciprocal rank, not raw
/// similarity, so it normalizes its scores before calling this.
pub fn score_from_parts(
    best: f64,
    mean: f64,
    count: usize,
    cache_hit: bool,
    history: Option<f64>,
    weights: &ConfidenceWeightsConfig,
) -> f64 {
    let saturation = weights.count_saturation.max(1);
    let count_factor = (count as f64 / saturation as f64).min(1.0);

    let mut confidence = weights.best_score * best.clamp(0.0, 1.0)
        + weights.mean_score * mean.clamp(0.0, 1.0)
        + weights.passage_count * count_factor;

    if cache_hit {
        confidence += weights.cache_hit_bias;
    }
    if let Some(history) = history {
        confidence += weights.history * history.clamp(0.0, 1.0);
    }

    confidence.clamp(0.0, 1.0)
}
