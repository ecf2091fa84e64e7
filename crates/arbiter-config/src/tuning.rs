use serde::Deserialize;

/// Threshold auto-tuning configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuningConfig {
    /// Whether the tuner may apply recommendations automatically
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between tuning passes
    #[serde(default = "default_interval_s")]
    pub interval_s: u64,
    /// Minimum outcomes in the window before analysis runs
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Compute recommendations without applying them
    #[serde(default)]
    pub dry_run: bool,
    /// Step size for a single threshold nudge
    #[serde(default = "default_step")]
    pub step: f64,
    /// Lower bound for tuned complexity thresholds
    #[serde(default = "default_complexity_min")]
    pub complexity_min: f64,
    /// Upper bound for tuned complexity thresholds
    #[serde(default = "default_complexity_max")]
    pub complexity_max: f64,
    /// Relative regression beyond which an applied set is rolled back
    #[serde(default = "default_regression_margin")]
    pub regression_margin: f64,
    /// Outcome window capacity
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Target share of traffic per mode
    #[serde(default)]
    pub targets: TargetDistributionConfig,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_s: default_interval_s(),
            min_samples: default_min_samples(),
            dry_run: false,
            step: default_step(),
            complexity_min: default_complexity_min(),
            complexity_max: default_complexity_max(),
            regression_margin: default_regression_margin(),
            window_size: default_window_size(),
            targets: TargetDistributionConfig::default(),
        }
    }
}

/// Target bands for the observed mode distribution, as fractions
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDistributionConfig {
    #[serde(default = "default_fast_min")]
    pub fast_min: f64,
    #[serde(default = "default_fast_max")]
    pub fast_max: f64,
    #[serde(default = "default_balanced_min")]
    pub balanced_min: f64,
    #[serde(default = "default_balanced_max")]
    pub balanced_max: f64,
    #[serde(default = "default_deep_min")]
    pub deep_min: f64,
    #[serde(default = "default_deep_max")]
    pub deep_max: f64,
}

impl Default for TargetDistributionConfig {
    fn default() -> Self {
        Self {
            fast_min: default_fast_min(),
            fast_max: default_fast_max(),
            balanced_min: default_balanced_min(),
            balanced_max: default_balanced_max(),
            deep_min: default_deep_min(),
            deep_max: default_deep_max(),
        }
    }
}

const fn default_interval_s() -> u64 {
    300
}

const fn default_min_samples() -> usize {
    50
}

const fn default_step() -> f64 {
    0.02
}

const fn default_complexity_min() -> f64 {
    0.05
}

const fn default_complexity_max() -> f64 {
    0.95
}

const fn default_regression_margin() -> f64 {
    0.15
}

const fn default_window_size() -> usize {
    1_000
}

const fn default_fast_min() -> f64 {
    0.40
}

const fn default_fast_max() -> f64 {
    0.50
}

const fn default_balanced_min() -> f64 {
    0.30
}

const fn default_balanced_max() -> f64 {
    0.40
}

const fn default_deep_min() -> f64 {
    0.20
}

const fn default_deep_max() -> f64 {
    0.30
}
