use serde::Deserialize;

/// Deep-retrieval fusion configuration
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FusionConfig {
    /// Upper bound on perspectives per query, clamped to [2, 7]
    #[serde(default = "default_max_perspectives")]
    pub max_perspectives: usize,
    /// RRF rank constant; non-finite or non-positive values fall back
    /// to the default at fuse time
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,
    /// MMR relevance vs diversity tradeoff, 1.0 = pure relevance
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,
    /// Sampling temperature for perspective paraphrase generation
    #[serde(default = "default_paraphrase_temperature")]
    pub paraphrase_temperature: f64,
    /// Token budget for one paraphrase generation call
    #[serde(default = "default_paraphrase_max_tokens")]
    pub paraphrase_max_tokens: u32,
    /// Per-perspective retrieval deadline
    #[serde(default = "default_perspective_timeout_ms")]
    pub perspective_timeout_ms: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            max_perspectives: default_max_perspectives(),
            rrf_k: default_rrf_k(),
            mmr_lambda: default_mmr_lambda(),
            paraphrase_temperature: default_paraphrase_temperature(),
            paraphrase_max_tokens: default_paraphrase_max_tokens(),
            perspective_timeout_ms: default_perspective_timeout_ms(),
        }
    }
}

const fn default_max_perspectives() -> usize {
    5
}

const fn default_rrf_k() -> f64 {
    60.0
}

const fn default_mmr_lambda() -> f64 {
    0.7
}

const fn default_paraphrase_temperature() -> f64 {
    0.9
}

const fn default_paraphrase_max_tokens() -> u32 {
    256
}

const fn default_perspective_timeout_ms() -> u64 {
    2_500
}
