//! Deep retrieval path
//!
//! Runs multi-perspective fused retrieval, diversifies the fused
//! candidates, and generates the final answer at the deep token budget.
//! The stage deadline cancels in-flight perspectives; whatever finished
//! by then is still fused and served.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use arbiter_config::{ConfidenceWeightsConfig, FusionConfig};
use arbiter_core::{Query, RetrievedPassage, TimeBudget};
use arbiter_fusion::{RagFusion, diversify, perspective_count};
use arbiter_providers::{GenerationProvider, RetrievalProvider};
use arbiter_routing::ModeProfile;

use crate::answer;
use crate::confidence;

/// Cache namespace for deep answers
pub const DEEP_NAMESPACE: &str = "deep";

/// Fused candidates handed to the diversifier, per requested passage
const CANDIDATE_MULTIPLIER: usize = 2;

/// Stage budget held back from fusion so generation still gets a slice
const GENERATION_RESERVE: Duration = Duration::from_millis(2_000);

/// Outcome of one deep attempt; degraded but never an error
pub struct DeepAnswer {
    pub answer_text: String,
    pub passages: Vec<RetrievedPassage>,
    pub confidence: f64,
}

/// Deep executor shared by every escalated request
pub struct DeepExecutor {
    fusion: RagFusion,
    generation: Option<Arc<dyn GenerationProvider>>,
    config: FusionConfig,
    weights: ConfidenceWeightsConfig,
}

impl DeepExecutor {
    pub fn new(
        retrieval: Arc<dyn RetrievalProvider>,
        generation: Option<Arc<dyn GenerationProvider>>,
        config: FusionConfig,
        weights: ConfidenceWeightsConfig,
    ) -> Self {
        Self {
            fusion: RagFusion::new(retrieval, generation.clone(), config),
            generation,
            config,
            weights,
        }
    }

    /// Run the deep path within the profile's time budget
    pub async fn execute(&self, query: &Query, complexity: f64, profile: &ModeProfile) -> DeepAnswer {
        let budget = TimeBudget::start(profile.timeout);
        let cancel = CancellationToken::new();

        let num_perspectives = perspective_count(complexity, self.config.max_perspectives);
        let candidate_k = profile.top_k * CANDIDATE_MULTIPLIER;
        let fusion_slice = budget.remaining().saturating_sub(GENERATION_RESERVE);

        let search = self.fusion.fused_search(query, candidate_k, num_perspectives, &cancel);
        tokio::pin!(search);

        let fused = tokio::select! {
            result = &mut search => result,
            () = tokio::time::sleep(fusion_slice) => {
                // Deadline reached; cancel stragglers and fuse the survivors.
                cancel.cancel();
                search.await
            }
        };

        let candidates = match fused {
            Ok(passages) => passages,
            Err(error) => {
                tracing::warn!(%error, "deep retrieval produced no passages");
                Vec::new()
            }
        };

        let passages = diversify(None, candidates, profile.top_k, self.config.mmr_lambda);

        // Fused scores are reciprocal rank sums, not similarities, so
        // they are rank-normalized before entering the confidence formula.
        let (best, mean) = normalized_scores(&passages);
        let confidence =
            confidence::score_from_parts(best, mean, passages.len(), false, None, &self.weights);

        let slice = budget.remaining_or_floor(answer::GENERATION_FLOOR);
        let answer_text = answer::generate_or_fallback(
            self.generation.as_deref(),
            query,
            &passages,
            profile.max_tokens,
            slice,
        )
        .await;

        tracing::debug!(
            perspectives = num_perspectives,
            passages = passages.len(),
            confidence,
            elapsed_ms = budget.elapsed().as_millis() as u64,
            "deep attempt finished"
        );

        DeepAnswer {
            answer_text,
            passages,
            confidence,
        }
    }
}

fn normalized_scores(passages: &[RetrievedPassage]) -> (f64, f64) {
    if passages.is_empty() {
        return (0.0, 0.0);
    }

    let scores: Vec<f64> = passages.iter().map(|passage| f64::from(passage.score)).collect();
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return (1.0, 1.0);
    }

    let mean = scores.iter().map(|score| (score - min) / (max - min)).sum::<f64>()
        / scores.len() as f64;
    (1.0, mean)
}
