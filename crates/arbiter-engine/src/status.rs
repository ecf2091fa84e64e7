//! Operator status surface
//!
//! A point-in-time snapshot of everything an operator needs to judge
//! the router: live thresholds, per-mode traffic aggregates, cache
//! health, and what the tuner has been doing.

use serde::Serialize;

use arbiter_cache::CacheStats;
use arbiter_core::{Mode, ThresholdSet};
use arbiter_routing::ModeAggregate;
use arbiter_tuning::{PerformanceAnalysis, TuningResult};

/// Cumulative traffic aggregate for one mode
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModeStatus {
    pub mode: Mode,
    #[serde(flatten)]
    pub aggregate: ModeAggregate,
}

/// Snapshot of the engine for operators
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    /// Thresholds currently steering routing decisions
    pub thresholds: ThresholdSet,
    /// Whether the tuner may apply recommendations on its own
    pub auto_tuning: bool,
    /// Per-mode aggregates since startup, for modes that saw traffic
    pub modes: Vec<ModeStatus>,
    /// Hit and size counters for both cache tiers
    pub cache: CacheStats,
    /// Most recent window analysis, once enough samples arrived
    pub last_analysis: Option<PerformanceAnalysis>,
    /// Recent tuning results, oldest first
    pub tuning_history: Vec<TuningResult>,
}
