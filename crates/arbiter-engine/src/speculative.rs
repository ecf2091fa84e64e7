//! Speculative fast-path execution
//!
//! Runs one cache-then-retrieve-then-generate attempt at the decided
//! mode's resource budget. Ordinary failures never surface: a timed-out
//! or failed stage degrades the result and lowers its confidence, and
//! the escalation decision takes it from there.

use std::sync::Arc;
use std::time::Duration;

use arbiter_cache::{CachedAnswer, ResponseCache};
use arbiter_config::ConfidenceWeightsConfig;
use arbiter_core::{Mode, Query, RetrievedPassage, SpeculativeResult, TimeBudget};
use arbiter_providers::{GenerationProvider, RetrievalProvider, SearchRequest};
use arbiter_routing::{ModeProfile, OutcomeLog};

use crate::answer;
use crate::confidence;

/// Cache namespace for speculative answers
pub const SPEC_NAMESPACE: &str = "spec";

/// One-shot speculative executor shared by every request
pub struct SpeculativeExecutor {
    cache: Arc<ResponseCache>,
    retrieval: Option<Arc<dyn RetrievalProvider>>,
    generation: Option<Arc<dyn GenerationProvider>>,
    outcomes: Arc<OutcomeLog>,
    weights: ConfidenceWeightsConfig,
}

impl SpeculativeExecutor {
    pub fn new(
        cache: Arc<ResponseCache>,
        retrieval: Option<Arc<dyn RetrievalProvider>>,
        generation: Option<Arc<dyn GenerationProvider>>,
        outcomes: Arc<OutcomeLog>,
        weights: ConfidenceWeightsConfig,
    ) -> Self {
        Self {
            cache,
            retrieval,
            generation,
            outcomes,
            weights,
        }
    }

    /// Produce a speculative result within the profile's time budget
    pub async fn execute(&self, query: &Query, mode: Mode, profile: &ModeProfile) -> SpeculativeResult {
        let budget = TimeBudget::start(profile.timeout);
        let key = self.cache.key(SPEC_NAMESPACE, mode, query);

        if !query.bypass_cache {
            if let Some(cached) = self.cache.get(&key).await {
                // Stored confidence plus the configured cache bias; the
                // passages are not re-scored.
                let confidence =
                    (cached.confidence + self.weights.cache_hit_bias).clamp(0.0, 1.0);
                tracing::debug!(%mode, confidence, "serving speculative answer from cache");
                return SpeculativeResult {
                    answer_text: cached.answer_text.clone(),
                    passages: cached.passages.clone(),
                    confidence,
                    cache_hit: true,
                    elapsed_ms: budget.elapsed().as_millis() as u64,
                };
            }
        }

        let passages = self.retrieve(query, profile, &budget).await;
        let slice = budget.remaining_or_floor(answer::GENERATION_FLOOR);
        let answer_text = answer::generate_or_fallback(
            self.generation.as_deref(),
            query,
            &passages,
            profile.max_tokens,
            slice,
        )
        .await;

        let history = self.outcomes.aggregate(mode).and_then(|aggregate| aggregate.mean_feedback);
        let confidence = confidence::score(&passages, false, history, &self.weights);
        tracing::debug!(
            %mode,
            passages = passages.len(),
            confidence,
            elapsed_ms = budget.elapsed().as_millis() as u64,
            "speculative attempt finished"
        );

        // Ungrounded answers are not cached; a retrieval outage would
        // otherwise pin its degraded answer for the full TTL.
        if !query.bypass_cache && !passages.is_empty() {
            self.cache
                .insert(
                    &key,
                    CachedAnswer {
                        answer_text: answer_text.clone(),
                        passages: passages.clone(),
                        confidence,
                        mode,
                    },
                    profile.cache_ttl,
                )
                .await;
        }

        SpeculativeResult {
            answer_text,
            passages,
            confidence,
            cache_hit: false,
            elapsed_ms: budget.elapsed().as_millis() as u64,
        }
    }

    async fn retrieve(
        &self,
        query: &Query,
        profile: &ModeProfile,
        budget: &TimeBudget,
    ) -> Vec<RetrievedPassage> {
        let Some(retrieval) = &self.retrieval else {
            tracing::debug!("no retrieval provider configured, answering without passages");
            return Vec::new();
        };

        let request = SearchRequest {
            query_text: query.text.clone(),
            top_k: profile.top_k,
            filter: query.filter.clone(),
            include_embeddings: true,
        };

        match tokio::time::timeout(budget.remaining(), retrieval.search(&request)).await {
            Ok(Ok(passages)) => passages,
            Ok(Err(error)) => {
                tracing::warn!(%error, "retrieval failed, continuing without passages");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = budget.elapsed().as_millis() as u64,
                    "retrieval timed out, continuing without passages"
                );
                Vec::new()
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use arbiter_cache::CacheError;
    use arbiter_config::CacheConfig;
    use arbiter_providers::{GenerationRequest, GenerationResponse, ProviderError};

    use crate::fallback;

    use super::*;

    struct FakeRetrieval {
        passages: Vec<RetrievedPassage>,
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeRetrieval {
        fn returning(passages: Vec<RetrievedPassage>) -> Self {
            Self {
                passages,
                fail: false,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                passages: Vec::new(),
                fail: true,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RetrievalProvider for FakeRetrieval {
        async fn search(
            &self,
            _request: &SearchRequest,
        ) -> arbiter_providers::Result<Vec<RetrievedPassage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ProviderError::Upstream("search index offline".to_owned()));
            }
            Ok(self.passages.clone())
        }

        fn name(&self) -> &str {
            "fake-retrieval"
        }
    }

    struct FakeGeneration {
        text: String,
        fail: bool,
        delay: Option<Duration>,
    }

    impl FakeGeneration {
        fn answering(text: &str) -> Self {
            Self {
                text: text.to_owned(),
                fail: false,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for FakeGeneration {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> arbiter_providers::Result<GenerationResponse> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ProviderError::Upstream("model overloaded".to_owned()));
            }
            Ok(GenerationResponse {
                text: self.text.clone(),
                prompt_tokens: Some(50),
                completion_tokens: Some(20),
            })
        }

        fn name(&self) -> &str {
            "fake-generation"
        }
    }

    fn passage(id: &str, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            id: id.to_owned(),
            text: format!("passage {id}"),
            score,
            source_document_id: "doc-1".to_owned(),
            embedding: None,
        }
    }

    fn profile() -> ModeProfile {
        ModeProfile {
            timeout: Duration::from_millis(1_500),
            top_k: 4,
            cache_ttl: Duration::from_secs(300),
            max_tokens: 256,
        }
    }

    fn executor(
        retrieval: Option<Arc<dyn RetrievalProvider>>,
        generation: Option<Arc<dyn GenerationProvider>>,
    ) -> Result<SpeculativeExecutor, CacheError> {
        Ok(SpeculativeExecutor::new(
            Arc::new(ResponseCache::new(&CacheConfig::default())?),
            retrieval,
            generation,
            Arc::new(OutcomeLog::new(16)),
            ConfidenceWeightsConfig::default(),
        ))
    }

    #[tokio::test]
    async fn generates_an_answer_from_retrieved_passages() {
        let executor = executor(
            Some(Arc::new(FakeRetrieval::returning(vec![
                passage("p-1", 0.9),
                passage("p-2", 0.8),
            ]))),
            Some(Arc::new(FakeGeneration::answering("Paris."))),
        )
        .unwrap();

        let result = executor.execute(&Query::new("capital of France?"), Mode::Fast, &profile()).await;
        assert_eq!(result.answer_text, "Paris.");
        assert_eq!(result.passages.len(), 2);
        assert!(!result.cache_hit);
        assert!(result.confidence > 0.5);
    }

    #[tokio::test]
    async fn second_identical_query_hits_the_cache() {
        let retrieval = Arc::new(FakeRetrieval::returning(vec![passage("p-1", 0.9)]));
        let executor = executor(
            Some(Arc::clone(&retrieval) as Arc<dyn RetrievalProvider>),
            Some(Arc::new(FakeGeneration::answering("Paris."))),
        )
        .unwrap();

        let query = Query::new("capital of France?");
        let first = executor.execute(&query, Mode::Fast, &profile()).await;
        let second = executor.execute(&query, Mode::Fast, &profile()).await;

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(second.answer_text, "Paris.");
        assert_eq!(retrieval.calls.load(Ordering::SeqCst), 1);
        // Bias on top of the stored confidence.
        assert!(second.confidence >= first.confidence);
    }

    #[tokio::test]
    async fn bypass_cache_skips_lookup_and_write() {
        let retrieval = Arc::new(FakeRetrieval::returning(vec![passage("p-1", 0.9)]));
        let executor = executor(
            Some(Arc::clone(&retrieval) as Arc<dyn RetrievalProvider>),
            Some(Arc::new(FakeGeneration::answering("Paris."))),
        )
        .unwrap();

        let mut query = Query::new("capital of France?");
        query.bypass_cache = true;

        let first = executor.execute(&query, Mode::Fast, &profile()).await;
        let second = executor.execute(&query, Mode::Fast, &profile()).await;
        assert!(!first.cache_hit);
        assert!(!second.cache_hit);
        assert_eq!(retrieval.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_ungrounded_generation() {
        let executor = executor(
            Some(Arc::new(FakeRetrieval::failing())),
            Some(Arc::new(FakeGeneration::answering("Best effort."))),
        )
        .unwrap();

        let result = executor.execute(&Query::new("anything"), Mode::Balanced, &profile()).await;
        assert_eq!(result.answer_text, "Best effort.");
        assert!(result.passages.is_empty());
        assert!(result.confidence < 0.4, "no passages must score low");
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_extractive_answer() {
        let executor = executor(
            Some(Arc::new(FakeRetrieval::returning(vec![passage("p-1", 0.9)]))),
            Some(Arc::new(FakeGeneration {
                text: String::new(),
                fail: true,
                delay: None,
            })),
        )
        .unwrap();

        let result = executor.execute(&Query::new("anything"), Mode::Fast, &profile()).await;
        assert!(result.answer_text.contains("passage p-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn generation_timeout_falls_back_to_extractive_answer() {
        let executor = executor(
            Some(Arc::new(FakeRetrieval::returning(vec![passage("p-1", 0.9)]))),
            Some(Arc::new(FakeGeneration {
                text: "too late".to_owned(),
                fail: false,
                delay: Some(Duration::from_secs(30)),
            })),
        )
        .unwrap();

        let result = executor.execute(&Query::new("anything"), Mode::Fast, &profile()).await;
        assert!(result.answer_text.contains("passage p-1"));
        assert!(!result.answer_text.contains("too late"));
    }

    #[tokio::test]
    async fn total_degradation_still_answers() {
        let executor = executor(Some(Arc::new(FakeRetrieval::failing())), None).unwrap();

        let result = executor.execute(&Query::new("anything"), Mode::Fast, &profile()).await;
        assert_eq!(result.answer_text, fallback::UNABLE_TO_ANSWER);
        assert!(result.passages.is_empty());
    }
}
