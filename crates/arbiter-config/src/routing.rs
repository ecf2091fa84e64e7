use serde::Deserialize;

/// Adaptive routing configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Whether adaptive routing is enabled; when disabled every query
    /// runs at the balanced profile and classification is skipped
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Initial routing thresholds
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    /// Where a low-confidence FAST result escalates to
    #[serde(default)]
    pub escalation_target: EscalationTarget,
    /// Complexity classifier feature weights
    #[serde(default)]
    pub classifier: ClassifierWeightsConfig,
    /// Confidence score component weights
    #[serde(default)]
    pub confidence: ConfidenceWeightsConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: ThresholdsConfig::default(),
            escalation_target: EscalationTarget::default(),
            classifier: ClassifierWeightsConfig::default(),
            confidence: ConfidenceWeightsConfig::default(),
        }
    }
}

/// Initial values for the live threshold set
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdsConfig {
    /// Complexity below this routes FAST
    #[serde(default = "default_complexity_simple")]
    pub complexity_simple: f64,
    /// Complexity above this routes DEEP
    #[serde(default = "default_complexity_complex")]
    pub complexity_complex: f64,
    /// Confidence at or above this accepts the speculative result
    #[serde(default = "default_confidence_high")]
    pub confidence_high: f64,
    /// Confidence below this escalates
    #[serde(default = "default_confidence_low")]
    pub confidence_low: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            complexity_simple: default_complexity_simple(),
            complexity_complex: default_complexity_complex(),
            confidence_high: default_confidence_high(),
            confidence_low: default_confidence_low(),
        }
    }
}

/// Deeper profile used when a FAST speculative result escalates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTarget {
    /// Escalate one step, to the balanced profile
    Balanced,
    /// Escalate straight to the deep profile
    #[default]
    Deep,
}

/// Feature weights for the complexity classifier
///
/// The weighted feature sum is clamped to [0, 1]; weights need not sum
/// to one.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierWeightsConfig {
    /// Weight of normalized query length
    #[serde(default = "default_w_length")]
    pub length: f64,
    /// Weight per multi-hop / comparison marker
    #[serde(default = "default_w_marker")]
    pub marker: f64,
    /// Weight added when the query asks for an enumeration
    #[serde(default = "default_w_list")]
    pub list_cue: f64,
    /// Weight per prior conversation turn
    #[serde(default = "default_w_context")]
    pub context_turn: f64,
}

impl Default for ClassifierWeightsConfig {
    fn default() -> Self {
        Self {
            length: default_w_length(),
            marker: default_w_marker(),
            list_cue: default_w_list(),
            context_turn: default_w_context(),
        }
    }
}

/// Component weights for the speculative confidence score
///
/// The exact combination is a tunable heuristic, so every component is
/// exposed here rather than hard-coded.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfidenceWeightsConfig {
    /// Weight of the best passage similarity score
    #[serde(default = "default_w_best")]
    pub best_score: f64,
    /// Weight of the mean passage similarity score
    #[serde(default = "default_w_mean")]
    pub mean_score: f64,
    /// Weight of the passage-count saturation factor
    #[serde(default = "default_w_count")]
    pub passage_count: f64,
    /// Additive bias applied to cache hits
    #[serde(default = "default_w_cache")]
    pub cache_hit_bias: f64,
    /// Weight of the similar-query historical success rate
    #[serde(default = "default_w_history")]
    pub history: f64,
    /// Passage count at which the count factor saturates
    #[serde(default = "default_count_saturation")]
    pub count_saturation: usize,
}

impl Default for ConfidenceWeightsConfig {
    fn default() -> Self {
        Self {
            best_score: default_w_best(),
            mean_score: default_w_mean(),
            passage_count: default_w_count(),
            cache_hit_bias: default_w_cache(),
            history: default_w_history(),
            count_saturation: default_count_saturation(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_complexity_simple() -> f64 {
    0.3
}

const fn default_complexity_complex() -> f64 {
    0.7
}

const fn default_confidence_high() -> f64 {
    0.75
}

const fn default_confidence_low() -> f64 {
    0.4
}

const fn default_w_length() -> f64 {
    0.35
}

const fn default_w_marker() -> f64 {
    0.2
}

const fn default_w_list() -> f64 {
    0.15
}

const fn default_w_context() -> f64 {
    0.05
}

const fn default_w_best() -> f64 {
    0.45
}

const fn default_w_mean() -> f64 {
    0.25
}

const fn default_w_count() -> f64 {
    0.2
}

const fn default_w_cache() -> f64 {
    0.1
}

const fn default_w_history() -> f64 {
    0.1
}

const fn default_count_saturation() -> usize {
    5
}
