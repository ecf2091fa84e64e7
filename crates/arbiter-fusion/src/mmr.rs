//! Maximum marginal relevance diversification
//!
//! Greedy re-ranking of the fused candidate set that trades relevance
//! against similarity to passages already selected:
//!
//! ```text
//! MMR(d) = lambda * Rel(d, q) - (1 - lambda) * max_{d' in S} Sim(d, d')
//! ```
//!
//! Relevance comes from the query embedding when one is available,
//! otherwise from the fused score normalized over the candidate set.
//! Candidates without embeddings cannot be compared, so the whole pass
//! degrades to relevance ordering when any embedding is missing.

use arbiter_core::{RetrievedPassage, cosine_similarity};

/// Select up to `top_k` candidates balancing relevance and diversity
///
/// Candidates are expected in fused relevance order. The output never
/// contains duplicates and never exceeds `top_k`.
pub fn diversify(
    query_embedding: Option<&[f32]>,
    candidates: Vec<RetrievedPassage>,
    top_k: usize,
    lambda: f64,
) -> Vec<RetrievedPassage> {
    if top_k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    if candidates.iter().any(|candidate| candidate.embedding.is_none()) {
        tracing::debug!(
            candidates = candidates.len(),
            "candidate embeddings missing, keeping relevance order"
        );
        return truncate(candidates, top_k);
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let diversity_weight = 1.0 - lambda;
    let relevance = relevance_scores(query_embedding, &candidates);

    let n = candidates.len();
    let k = top_k.min(n);
    let mut selected: Vec<usize> = Vec::with_capacity(k);
    let mut remaining = vec![true; n];

    // First slot goes to pure relevance.
    let first = relevance
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(index, _)| index);
    selected.push(first);
    remaining[first] = false;

    for _ in 1..k {
        let mut best_index = usize::MAX;
        let mut best_mmr = f64::NEG_INFINITY;

        for i in 0..n {
            if !remaining[i] {
                continue;
            }

            let max_similarity = selected
                .iter()
                .map(|&j| {
                    f64::from(cosine_similarity(embedding(&candidates[i]), embedding(&candidates[j])))
                })
                .fold(f64::NEG_INFINITY, f64::max);

            let mmr = lambda.mul_add(relevance[i], -(diversity_weight * max_similarity));
            if mmr > best_mmr {
                best_mmr = mmr;
                best_index = i;
            }
        }

        if best_index == usize::MAX {
            break;
        }
        selected.push(best_index);
        remaining[best_index] = false;
    }

    let mut by_index: Vec<Option<RetrievedPassage>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|index| by_index[index].take())
        .collect()
}

fn truncate(mut candidates: Vec<RetrievedPassage>, top_k: usize) -> Vec<RetrievedPassage> {
    candidates.truncate(top_k);
    candidates
}

fn embedding(passage: &RetrievedPassage) -> &[f32] {
    passage.embedding.as_deref().unwrap_or_default()
}

/// Relevance per candidate in [0, 1], or [-1, 1] for query similarity
fn relevance_scores(query_embedding: Option<&[f32]>, candidates: &[RetrievedPassage]) -> Vec<f64> {
    if let Some(query) = query_embedding {
        return candidates
            .iter()
            .map(|candidate| f64::from(cosine_similarity(query, embedding(candidate))))
            .collect();
    }

    // Min-max normalize fused scores so they compare fairly with cosine
    // similarity; all-equal scores collapse to 1.0.
    let (min, max) = candidates
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), candidate| {
            let score = f64::from(candidate.score);
            (min.min(score), max.max(score))
        });
    let range = max - min;

    candidates
        .iter()
        .map(|candidate| {
            if range < f64::EPSILON {
                1.0
            } else {
                (f64::from(candidate.score) - min) / range
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn passage(id: &str, score: f32, embedding: Option<Vec<f32>>) -> RetrievedPassage {
        RetrievedPassage {
            id: id.to_owned(),
            text: format!("text for {id}"),
            score,
            source_document_id: "doc".to_owned(),
            embedding,
        }
    }

    fn ids(passages: &[RetrievedPassage]) -> Vec<&str> {
        passages.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn near_duplicate_is_penalized() {
        let candidates = vec![
            passage("top", 0.9, Some(vec![1.0, 0.0, 0.0])),
            passage("near-dup", 0.85, Some(vec![0.99, 0.1, 0.0])),
            passage("diverse", 0.84, Some(vec![0.0, 1.0, 0.0])),
            passage("other", 0.5, Some(vec![0.0, 0.0, 1.0])),
        ];

        let selected = diversify(None, candidates, 3, 0.5);
        assert_eq!(selected[0].id, "top");
        assert_eq!(selected[1].id, "diverse");
    }

    #[test]
    fn lambda_one_is_pure_relevance() {
        let candidates = vec![
            passage("a", 0.9, Some(vec![1.0, 0.0])),
            passage("b", 0.85, Some(vec![0.99, 0.1])),
            passage("c", 0.8, Some(vec![0.0, 1.0])),
        ];

        let selected = diversify(None, candidates, 3, 1.0);
        assert_eq!(ids(&selected), vec!["a", "b", "c"]);
    }

    #[test]
    fn query_embedding_drives_relevance() {
        // Fused scores favor "a", but the query vector matches "b".
        let candidates = vec![
            passage("a", 0.9, Some(vec![1.0, 0.0])),
            passage("b", 0.5, Some(vec![0.0, 1.0])),
        ];

        let selected = diversify(Some(&[0.0, 1.0]), candidates, 1, 0.7);
        assert_eq!(ids(&selected), vec!["b"]);
    }

    #[test]
    fn missing_embeddings_keep_relevance_order() {
        let candidates = vec![
            passage("a", 0.9, Some(vec![1.0, 0.0])),
            passage("b", 0.8, None),
            passage("c", 0.7, Some(vec![0.0, 1.0])),
        ];

        let selected = diversify(None, candidates, 2, 0.5);
        assert_eq!(ids(&selected), vec!["a", "b"]);
    }

    #[test]
    fn never_exceeds_top_k_nor_duplicates() {
        let candidates = vec![
            passage("a", 0.9, Some(vec![1.0, 0.0])),
            passage("b", 0.8, Some(vec![1.0, 0.0])),
            passage("c", 0.7, Some(vec![1.0, 0.0])),
        ];

        let selected = diversify(None, candidates, 2, 0.5);
        assert_eq!(selected.len(), 2);

        let unique: HashSet<&str> = selected.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(unique.len(), selected.len());
    }

    #[test]
    fn top_k_beyond_candidates_returns_all() {
        let candidates = vec![
            passage("a", 0.9, Some(vec![1.0, 0.0])),
            passage("b", 0.5, Some(vec![0.0, 1.0])),
        ];
        assert_eq!(diversify(None, candidates, 10, 0.7).len(), 2);
    }

    #[test]
    fn empty_and_zero_k_inputs() {
        assert!(diversify(None, Vec::new(), 5, 0.7).is_empty());

        let candidates = vec![passage("a", 0.9, Some(vec![1.0]))];
        assert!(diversify(None, candidates, 0, 0.7).is_empty());
    }

    #[test]
    fn equal_scores_all_selected() {
        let candidates = vec![
            passage("a", 0.5, Some(vec![1.0, 0.0, 0.0])),
            passage("b", 0.5, Some(vec![0.0, 1.0, 0.0])),
            passage("c", 0.5, Some(vec![0.0, 0.0, 1.0])),
        ];

        let selected = diversify(None, candidates, 3, 0.5);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn out_of_range_lambda_is_clamped() {
        let candidates = vec![
            passage("a", 0.9, Some(vec![1.0, 0.0])),
            passage("b", 0.8, Some(vec![0.0, 1.0])),
        ];

        let selected = diversify(None, candidates, 2, 1.5);
        assert_eq!(ids(&selected), vec!["a", "b"]);
    }
}
