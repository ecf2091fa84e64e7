//! Reciprocal Rank Fusion over per-perspective result lists
//!
//! Each perspective contributes `1 / (k + rank)` with 1-indexed ranks,
//! so a passage found by several perspectives accumulates score from
//! each. Accumulation is commutative: fusing the same result sets in
//! any perspective order yields the same ranking.

use std::collections::HashMap;

use arbiter_core::RetrievedPassage;

/// Standard RRF rank constant
pub const DEFAULT_RRF_K: f64 = 60.0;

struct Accumulated {
    passage: RetrievedPassage,
    score: f64,
    best_rank: usize,
}

/// Merge per-perspective result lists into one ranked list
///
/// The returned passages carry the fused score in place of the backend
/// relevance score. Ties break by best individual rank, then passage id,
/// so the output order is deterministic.
pub fn fuse(
    result_sets: &[Vec<RetrievedPassage>],
    k: f64,
    top_k: usize,
) -> Vec<RetrievedPassage> {
    let k = sanitize_k(k);
    let mut merged: HashMap<String, Accumulated> = HashMap::new();

    for set in result_sets {
        for (index, passage) in set.iter().enumerate() {
            let rank = index + 1;
            let contribution = 1.0 / (k + rank as f64);

            merged
                .entry(passage.id.clone())
                .and_modify(|accumulated| {
                    accumulated.score += contribution;
                    accumulated.best_rank = accumulated.best_rank.min(rank);
                })
                .or_insert_with(|| Accumulated {
                    passage: passage.clone(),
                    score: contribution,
                    best_rank: rank,
                });
        }
    }

    let mut fused: Vec<Accumulated> = merged.into_values().collect();
    fused.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.best_rank.cmp(&b.best_rank))
            .then_with(|| a.passage.id.cmp(&b.passage.id))
    });

    fused
        .into_iter()
        .take(top_k)
        .map(|accumulated| {
            let mut passage = accumulated.passage;
            passage.score = accumulated.score as f32;
            passage
        })
        .collect()
}

/// Guard against non-finite or non-positive k from configuration
fn sanitize_k(k: f64) -> f64 {
    if k.is_finite() && k > 0.0 { k } else { DEFAULT_RRF_K }
}
