//! Heuristic query complexity classification
//!
//! Scores queries by token count and pattern matching. No ML pipeline,
//! pure deterministic heuristics: the same query always produces the
//! same score.

use std::sync::LazyLock;

use regex::Regex;
use tiktoken_rs::o200k_base;

use arbiter_config::ClassifierWeightsConfig;
use arbiter_core::{ComplexityFeatures, ComplexityScore, Mode, Query, ThresholdSet};

/// Token count at which the length feature saturates at 1.0
const LENGTH_SATURATION_TOKENS: f64 = 64.0;

/// Conversation turns counted toward the context-depth bonus
const MAX_CONTEXT_TURNS: usize = 4;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:compare|contrast|versus|vs\.?|difference|differences|tradeoffs?|trade-offs?|pros and cons|relationship between|impact of|implications?|why|how|causes?|depends? on|affects?)\b",
    )
    .expect("must be valid regex")
});

static LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:list|enumerate|steps?|stages|top \d+|all (?:the|of))\b")
        .expect("must be valid regex")
});

/// Score a query's complexity in [0, 1]
///
/// Empty or whitespace-only text scores 0.0 with zeroed features.
pub fn classify(query: &Query, weights: &ClassifierWeightsConfig) -> ComplexityScore {
    let normalized = query.normalized_text();
    if normalized.is_empty() {
        return ComplexityScore::zero();
    }

    let tokens = estimate_tokens(&normalized);
    let features = ComplexityFeatures {
        length_norm: (tokens as f64 / LENGTH_SATURATION_TOKENS).min(1.0),
        marker_count: MARKER_RE.find_iter(&normalized).count(),
        list_cue: LIST_RE.is_match(&normalized),
        context_depth: query.context.len(),
    };

    let score = weighted_score(&features, weights);
    tracing::debug!(
        score,
        tokens,
        markers = features.marker_count,
        list_cue = features.list_cue,
        context_depth = features.context_depth,
        "classified query"
    );

    ComplexityScore { score, features }
}

/// Map a complexity score to a mode under the live thresholds
pub fn map_to_mode(score: f64, thresholds: &ThresholdSet) -> Mode {
    if score < thresholds.complexity_simple {
        Mode::Fast
    } else if score > thresholds.complexity_complex {
        Mode::Deep
    } else {
        Mode::Balanced
    }
}

fn weighted_score(features: &ComplexityFeatures, weights: &ClassifierWeightsConfig) -> f64 {
    let length_term = weights.length * features.length_norm;
    let marker_term = weights.marker * features.marker_count as f64;
    let list_term = if features.list_cue { weights.list_cue } else { 0.0 };
    let context_term = weights.context_turn * features.context_depth.min(MAX_CONTEXT_TURNS) as f64;

    (length_term + marker_term + list_term + context_term).clamp(0.0, 1.0)
}

/// Estimate token count using tiktoken
fn estimate_tokens(text: &str) -> usize {
    o200k_base().map_or_else(|_| text.len() / 4, |bpe| bpe.encode_with_special_tokens(text).len())
}

#[cfg(test)]
mod tests {
    use arbiter_core::{ConversationTurn, TurnRole};

    use super::*;

    fn weights() -> ClassifierWeightsConfig {
        ClassifierWeightsConfig::default()
    }

    #[test]
    fn classification_is_deterministic() {
        let query = Query::new("compare the economic policies of France and Germany");
        let a = classify(&query, &weights());
        let b = classify(&query, &weights());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_query_scores_zero() {
        let score = classify(&Query::new("   \t  "), &weights());
        assert_eq!(score, ComplexityScore::zero());
    }

    #[test]
    fn simple_factual_question_scores_low() {
        let score = classify(&Query::new("what is the capital of France?"), &weights());
        assert!(score.score < 0.3, "got {}", score.score);
        assert_eq!(score.features.marker_count, 0);
    }

    #[test]
    fn comparative_question_scores_higher_than_factual() {
        let simple = classify(&Query::new("what is the capital of France?"), &weights());
        let comparative = classify(
            &Query::new("compare the tradeoffs between France and Germany on energy policy"),
            &weights(),
        );
        assert!(comparative.score > simple.score);
        assert!(comparative.features.marker_count >= 2);
    }

    #[test]
    fn list_cue_is_detected() {
        let score = classify(&Query::new("list the steps to renew a passport"), &weights());
        assert!(score.features.list_cue);
    }

    #[test]
    fn context_depth_raises_score() {
        let bare = Query::new("what about Germany?");
        let mut contextual = Query::new("what about Germany?");
        contextual.context = vec![
            ConversationTurn {
                role: TurnRole::User,
                text: "what is the capital of France?".to_owned(),
            },
            ConversationTurn {
                role: TurnRole::Assistant,
                text: "Paris.".to_owned(),
            },
        ];

        let without = classify(&bare, &weights());
        let with = classify(&contextual, &weights());
        assert!(with.score > without.score);
        assert_eq!(with.features.context_depth, 2);
    }

    #[test]
    fn heavily_marked_query_clamps_to_one() {
        let query = Query::new(
            "compare and contrast the tradeoffs, explain why each difference matters, \
             how the implications affect policy, and list all of the steps involved",
        );
        let score = classify(&query, &weights());
        assert!(score.score <= 1.0);
        assert!(score.score > 0.7);
    }

    #[test]
    fn mode_mapping_respects_thresholds() {
        let thresholds = ThresholdSet::default();
        assert_eq!(map_to_mode(0.1, &thresholds), Mode::Fast);
        assert_eq!(map_to_mode(0.3, &thresholds), Mode::Balanced);
        assert_eq!(map_to_mode(0.5, &thresholds), Mode::Balanced);
        assert_eq!(map_to_mode(0.7, &thresholds), Mode::Balanced);
        assert_eq!(map_to_mode(0.9, &thresholds), Mode::Deep);
    }
}
