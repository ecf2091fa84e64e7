//! Adaptive retrieval routing engine
//!
//! Ties the pipeline together: classify the query, run a speculative
//! attempt at the decided mode's budget, judge its confidence, escalate
//! to multi-perspective deep retrieval when the answer is weak, and log
//! the outcome for the threshold tuner. Every query gets an answer;
//! runtime failures degrade quality, never availability.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod answer;
pub mod confidence;
pub mod deep;
mod error;
pub mod fallback;
mod prompt;
pub mod speculative;
pub mod status;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use arbiter_cache::{CachedAnswer, ResponseCache};
use arbiter_config::{ClassifierWeightsConfig, Config, EscalationTarget};
use arbiter_core::{
    ComplexityScore, Mode, Query, RetrievedPassage, RoutingOutcome, SpeculativeResult,
    ThresholdError, ThresholdSet,
};
use arbiter_providers::{GenerationProvider, RetrievalProvider};
use arbiter_routing::{
    Decision, ModeProfileRegistry, OutcomeLog, classify, decide, escalation_mode, map_to_mode,
};
use arbiter_tuning::{
    PerformanceAnalysis, ThresholdSnapshot, ThresholdTuner, TuningAction, TuningResult,
};

pub use deep::{DEEP_NAMESPACE, DeepAnswer, DeepExecutor};
pub use error::EngineError;
pub use speculative::{SPEC_NAMESPACE, SpeculativeExecutor};
pub use status::{EngineStatus, ModeStatus};

/// Final answer returned for one routed query
#[derive(Debug, Clone, Serialize)]
pub struct RoutedResponse {
    /// Generated or fallback answer text
    pub answer: String,
    /// Passages backing the answer, in relevance order
    pub passages: Vec<RetrievedPassage>,
    /// Mode that produced the served answer
    pub mode_used: Mode,
    /// Confidence of the served answer in [0, 1]
    pub confidence: f64,
    /// Whether the served answer came from the response cache
    pub cache_hit: bool,
    /// Whether the speculative result was discarded for a deep re-run
    pub escalated: bool,
    /// Wall-clock time for the whole pipeline
    pub latency_ms: u64,
}

/// The routing engine shared by every request
pub struct Engine {
    routing_enabled: bool,
    classifier_weights: ClassifierWeightsConfig,
    escalation_target: EscalationTarget,
    profiles: ModeProfileRegistry,
    cache: Arc<ResponseCache>,
    speculative: SpeculativeExecutor,
    deep: Option<DeepExecutor>,
    outcomes: Arc<OutcomeLog>,
    tuner: ThresholdTuner,
    tuning_dry_run: bool,
    tuning_interval: Duration,
    /// Analysis captured at the last threshold apply, compared against
    /// the next window to detect a regression
    baseline: Mutex<Option<PerformanceAnalysis>>,
}

impl Engine {
    /// Build the engine and its providers from configuration
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let providers = arbiter_providers::build(&config.providers);
        Self::with_providers(config, providers.retrieval, providers.generation)
    }

    /// Build the engine around already-constructed providers
    ///
    /// Without a retrieval provider the deep path is unavailable and
    /// low-confidence speculative answers are served as-is.
    pub fn with_providers(
        config: Config,
        retrieval: Option<Arc<dyn RetrievalProvider>>,
        generation: Option<Arc<dyn GenerationProvider>>,
    ) -> Result<Self, EngineError> {
        let thresholds = ThresholdSet {
            complexity_simple: config.routing.thresholds.complexity_simple,
            complexity_complex: config.routing.thresholds.complexity_complex,
            confidence_high: config.routing.thresholds.confidence_high,
            confidence_low: config.routing.thresholds.confidence_low,
        };
        thresholds.validate()?;

        let profiles = ModeProfileRegistry::from_config(&config.modes)?;
        let cache = Arc::new(ResponseCache::new(&config.cache)?);
        let outcomes = Arc::new(OutcomeLog::new(config.tuning.window_size));

        let speculative = SpeculativeExecutor::new(
            Arc::clone(&cache),
            retrieval.clone(),
            generation.clone(),
            Arc::clone(&outcomes),
            config.routing.confidence,
        );
        let deep = retrieval.map(|retrieval| {
            DeepExecutor::new(retrieval, generation, config.fusion, config.routing.confidence)
        });
        if deep.is_none() {
            tracing::warn!("no retrieval provider configured, escalation is disabled");
        }

        let tuning_dry_run = config.tuning.dry_run;
        let tuning_interval = Duration::from_secs(config.tuning.interval_s.max(1));
        let tuner =
            ThresholdTuner::new(config.tuning, Arc::new(ThresholdSnapshot::new(thresholds)));

        Ok(Self {
            routing_enabled: config.routing.enabled,
            classifier_weights: config.routing.classifier,
            escalation_target: config.routing.escalation_target,
            profiles,
            cache,
            speculative,
            deep,
            outcomes,
            tuner,
            tuning_dry_run,
            tuning_interval,
            baseline: Mutex::new(None),
        })
    }

    /// Route one query through the full pipeline
    pub async fn route(&self, query: &Query) -> RoutedResponse {
        let started = Instant::now();
        let thresholds = self.tuner.current();

        let (mode, complexity) = self.decide_mode(query, &thresholds);
        let profile = self.profiles.profile(mode);
        tracing::debug!(%mode, complexity = complexity.score, "query classified");

        let speculative = self.speculative.execute(query, mode, profile).await;
        let decision = decide(speculative.confidence, &thresholds);
        let ambiguous = decision == Decision::AcceptAmbiguous;

        let mut response = if decision == Decision::Escalate {
            match (escalation_mode(mode, self.escalation_target), &self.deep) {
                (Some(deep_mode), Some(deep)) => {
                    tracing::debug!(
                        %mode,
                        %deep_mode,
                        confidence = speculative.confidence,
                        "escalating low-confidence result"
                    );
                    self.run_deep(deep, query, deep_mode, complexity.score).await
                }
                _ => {
                    // No deeper profile to try; the weak answer is still
                    // the best available.
                    tracing::debug!(
                        %mode,
                        confidence = speculative.confidence,
                        "cannot escalate, serving low-confidence result"
                    );
                    serve_speculative(speculative, mode)
                }
            }
        } else {
            serve_speculative(speculative, mode)
        };
        response.latency_ms = started.elapsed().as_millis() as u64;

        self.outcomes.record(RoutingOutcome {
            mode,
            complexity_score: complexity.score,
            confidence: response.confidence,
            escalated: response.escalated,
            ambiguous,
            latency_ms: response.latency_ms,
            user_feedback: None,
        });

        tracing::info!(
            %mode,
            mode_used = %response.mode_used,
            confidence = response.confidence,
            escalated = response.escalated,
            cache_hit = response.cache_hit,
            latency_ms = response.latency_ms,
            "query routed"
        );
        response
    }

    /// Attach a post-hoc satisfaction score in [0, 1] to the latest query
    ///
    /// Returns false when no query has completed yet.
    pub fn record_feedback(&self, score: f64) -> bool {
        self.outcomes.attach_feedback(score.clamp(0.0, 1.0))
    }

    /// Run one tuning pass over the outcome window
    ///
    /// Checks the previous apply for a regression first, then lets the
    /// tuner recommend and apply a nudge. Returns None when the window
    /// is too thin, the distribution is on target, or auto-tuning is
    /// disabled by a manual override.
    pub fn run_tuning_cycle(&self) -> Option<TuningResult> {
        let window = self.outcomes.snapshot();
        let analysis = self.tuner.analyze_performance(&window)?;

        let baseline = self.baseline.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(baseline) = baseline {
            if self.tuner.check_regression(&baseline, &analysis)
                && self.tuner.rollback().is_some()
            {
                let mut history = self.tuner.history();
                return history.pop();
            }
        }

        if !self.tuner.auto_enabled() {
            return None;
        }

        let recommendation = self.tuner.recommend_thresholds(&analysis)?;
        let result = self.tuner.apply_thresholds(&recommendation, self.tuning_dry_run);
        if result.action == TuningAction::Applied {
            *self.baseline.lock().unwrap_or_else(PoisonError::into_inner) = Some(analysis);
        }
        Some(result)
    }

    /// Spawn the periodic tuning loop; cancel the token to stop it
    pub fn spawn_tuning_loop(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.tuning_interval);
            // The first tick fires immediately; consume it so the first
            // pass waits a full interval of traffic.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::debug!("tuning loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Some(result) = engine.run_tuning_cycle() {
                            tracing::debug!(action = ?result.action, "tuning cycle finished");
                        }
                    }
                }
            }
        })
    }

    /// Install thresholds by hand, disabling auto-tuning until re-enabled
    pub fn set_thresholds(&self, set: ThresholdSet) -> Result<(), ThresholdError> {
        self.tuner.set_manual(set)?;
        *self.baseline.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    /// Re-enable auto-tuning after a manual override
    pub fn enable_auto_tuning(&self) {
        self.tuner.enable_auto();
    }

    /// Thresholds currently steering routing decisions
    pub fn thresholds(&self) -> Arc<ThresholdSet> {
        self.tuner.current()
    }

    /// Snapshot the engine state for the operator surface
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            thresholds: *self.tuner.current(),
            auto_tuning: self.tuner.auto_enabled(),
            modes: self
                .outcomes
                .aggregates()
                .into_iter()
                .map(|(mode, aggregate)| ModeStatus { mode, aggregate })
                .collect(),
            cache: self.cache.stats(),
            last_analysis: self.tuner.last_analysis(),
            tuning_history: self.tuner.history(),
        }
    }

    fn decide_mode(&self, query: &Query, thresholds: &ThresholdSet) -> (Mode, ComplexityScore) {
        if let Some(mode) = query.mode_override {
            tracing::debug!(%mode, "mode override supplied, skipping classification");
            return (mode, ComplexityScore::zero());
        }
        if !self.routing_enabled {
            return (Mode::Balanced, ComplexityScore::zero());
        }

        let complexity = classify(query, &self.classifier_weights);
        let mode = map_to_mode(complexity.score, thresholds);
        (mode, complexity)
    }

    async fn run_deep(
        &self,
        deep: &DeepExecutor,
        query: &Query,
        deep_mode: Mode,
        complexity: f64,
    ) -> RoutedResponse {
        let profile = self.profiles.profile(deep_mode);
        let key = self.cache.key(DEEP_NAMESPACE, deep_mode, query);

        if !query.bypass_cache {
            if let Some(cached) = self.cache.get(&key).await {
                tracing::debug!(%deep_mode, "serving escalated answer from cache");
                return RoutedResponse {
                    answer: cached.answer_text.clone(),
                    passages: cached.passages.clone(),
                    mode_used: deep_mode,
                    confidence: cached.confidence,
                    cache_hit: true,
                    escalated: true,
                    latency_ms: 0,
                };
            }
        }

        let result = deep.execute(query, complexity, profile).await;

        if !query.bypass_cache && !result.passages.is_empty() {
            self.cache
                .insert(
                    &key,
                    CachedAnswer {
                        answer_text: result.answer_text.clone(),
                        passages: result.passages.clone(),
                        confidence: result.confidence,
                        mode: deep_mode,
                    },
                    profile.cache_ttl,
                )
                .await;
        }

        RoutedResponse {
            answer: result.answer_text,
            passages: result.passages,
            mode_used: deep_mode,
            confidence: result.confidence,
            cache_hit: false,
            escalated: true,
            latency_ms: 0,
        }
    }
}

fn serve_speculative(result: SpeculativeResult, mode: Mode) -> RoutedResponse {
    RoutedResponse {
        answer: result.answer_text,
        passages: result.passages,
        mode_used: mode,
        confidence: result.confidence,
        cache_hit: result.cache_hit,
        escalated: false,
        latency_ms: 0,
    }
}
