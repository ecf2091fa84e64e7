use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded = crate::env::expand_env(&raw)
            .map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if threshold ordering, mode profile monotonicity,
    /// or tuning bounds are violated
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_thresholds()?;
        self.validate_mode_profiles()?;
        self.validate_tuning()?;
        Ok(())
    }

    fn validate_thresholds(&self) -> anyhow::Result<()> {
        let t = &self.routing.thresholds;

        for (name, value) in [
            ("complexity_simple", t.complexity_simple),
            ("complexity_complex", t.complexity_complex),
            ("confidence_high", t.confidence_high),
            ("confidence_low", t.confidence_low),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                anyhow::bail!("routing.thresholds.{name} must be in (0, 1), got {value}");
            }
        }

        if t.complexity_simple >= t.complexity_complex {
            anyhow::bail!(
                "routing.thresholds.complexity_simple ({}) must be below complexity_complex ({})",
                t.complexity_simple,
                t.complexity_complex
            );
        }

        if t.confidence_low >= t.confidence_high {
            anyhow::bail!(
                "routing.thresholds.confidence_low ({}) must be below confidence_high ({})",
                t.confidence_low,
                t.confidence_high
            );
        }

        Ok(())
    }

    fn validate_mode_profiles(&self) -> anyhow::Result<()> {
        let m = &self.modes;

        if !(m.fast.timeout_ms < m.balanced.timeout_ms && m.balanced.timeout_ms < m.deep.timeout_ms)
        {
            anyhow::bail!(
                "mode timeouts must be strictly increasing fast < balanced < deep (got {}, {}, {})",
                m.fast.timeout_ms,
                m.balanced.timeout_ms,
                m.deep.timeout_ms
            );
        }

        if !(m.fast.top_k <= m.balanced.top_k && m.balanced.top_k <= m.deep.top_k) {
            anyhow::bail!(
                "mode top_k must be non-decreasing fast <= balanced <= deep (got {}, {}, {})",
                m.fast.top_k,
                m.balanced.top_k,
                m.deep.top_k
            );
        }

        if m.fast.top_k == 0 {
            anyhow::bail!("modes.fast.top_k must be at least 1");
        }

        Ok(())
    }

    fn validate_tuning(&self) -> anyhow::Result<()> {
        let t = &self.tuning;

        if t.step <= 0.0 || t.step >= 0.5 {
            anyhow::bail!("tuning.step must be in (0, 0.5), got {}", t.step);
        }

        if t.complexity_min >= t.complexity_max {
            anyhow::bail!(
                "tuning.complexity_min ({}) must be below complexity_max ({})",
                t.complexity_min,
                t.complexity_max
            );
        }

        let targets = &t.targets;
        for (name, min, max) in [
            ("fast", targets.fast_min, targets.fast_max),
            ("balanced", targets.balanced_min, targets.balanced_max),
            ("deep", targets.deep_min, targets.deep_max),
        ] {
            if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
                anyhow::bail!("tuning.targets.{name} band [{min}, {max}] is not a valid fraction range");
            }
        }

        Ok(())
    }
}
