use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Complete configuration for a rollout-statistics run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rollout: RolloutConfig,
    pub env: MockEnvConfig,
}

/// Episode accounting and reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Number of environment slots stepping in lockstep (default: 8).
    pub num_envs: usize,
    /// Report every this many finalized episodes; negative disables
    /// reporting, zero is invalid (default: 100).
    pub window_size: i64,
    /// Only record the mean score per window (default: false).
    pub simple: bool,
    /// Keep at most this many finalized episodes in memory (default: keep all).
    pub history_limit: Option<usize>,
}

/// Synthetic vectorized environment used by the `simulate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockEnvConfig {
    /// RNG seed (default: 0).
    pub seed: u64,
    /// Shortest episode in steps (default: 10).
    pub min_episode_len: u64,
    /// Longest episode in steps (default: 200).
    pub max_episode_len: u64,
    /// Centre of the per-step reward distribution (default: 1.0).
    pub reward_mean: f64,
    /// Half-width of the per-step reward distribution (default: 0.5).
    pub reward_spread: f64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            num_envs: 8,
            window_size: 100,
            simple: false,
            history_limit: None,
        }
    }
}

impl Default for MockEnvConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            min_episode_len: 10,
            max_episode_len: 200,
            reward_mean: 1.0,
            reward_spread: 0.5,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> StatsError {
    StatsError::InvalidConfig {
        field: field.to_string(),
        message: message.into(),
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), StatsError> {
        self.rollout.validate()?;
        self.env.validate()
    }
}

impl RolloutConfig {
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.num_envs == 0 {
            return Err(invalid("num_envs", "must be at least 1"));
        }
        if self.window_size == 0 {
            return Err(StatsError::ZeroWindow);
        }
        Ok(())
    }
}

impl MockEnvConfig {
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.min_episode_len == 0 {
            return Err(invalid("min_episode_len", "must be at least 1"));
        }
        if self.min_episode_len > self.max_episode_len {
            return Err(invalid(
                "max_episode_len",
                format!(
                    "{} is shorter than min_episode_len {}",
                    self.max_episode_len, self.min_episode_len
                ),
            ));
        }
        if !self.reward_mean.is_finite() {
            return Err(invalid(
                "reward_mean",
                format!("{} is not finite", self.reward_mean),
            ));
        }
        if self.reward_spread.is_nan() || self.reward_spread < 0.0 {
            return Err(invalid(
                "reward_spread",
                format!("{} must be non-negative", self.reward_spread),
            ));
        }
        // Rewards are drawn from mean +/- spread; the range width and both
        // bounds have to stay finite for the sampler.
        let low = self.reward_mean - self.reward_spread;
        let high = self.reward_mean + self.reward_spread;
        if !(2.0 * self.reward_spread).is_finite() || !low.is_finite() || !high.is_finite() {
            return Err(invalid(
                "reward_spread",
                format!(
                    "{} around reward_mean {} overflows the reward range",
                    self.reward_spread, self.reward_mean
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"rollout": {"window_size": -1}}"#).unwrap();
        assert_eq!(config.rollout.window_size, -1);
        assert_eq!(config.rollout.num_envs, 8);
        assert_eq!(config.env.max_episode_len, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_window_and_bad_lengths() {
        let mut config = AppConfig::default();
        config.rollout.window_size = 0;
        assert_eq!(config.validate(), Err(StatsError::ZeroWindow));

        let mut config = AppConfig::default();
        config.env.min_episode_len = 50;
        config.env.max_episode_len = 5;
        assert!(matches!(
            config.validate(),
            Err(StatsError::InvalidConfig { field, .. }) if field == "max_episode_len"
        ));
    }

    fn rejected_field(config: &AppConfig) -> Option<String> {
        match config.validate() {
            Err(StatsError::InvalidConfig { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn rejects_non_finite_reward_mean_under_its_own_field() {
        for mean in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut config = AppConfig::default();
            config.env.reward_mean = mean;
            assert_eq!(rejected_field(&config).as_deref(), Some("reward_mean"));
        }
    }

    #[test]
    fn rejects_spreads_the_sampler_cannot_draw_from() {
        for spread in [-0.1, f64::NAN, f64::INFINITY, 1e308] {
            let mut config = AppConfig::default();
            config.env.reward_spread = spread;
            assert_eq!(rejected_field(&config).as_deref(), Some("reward_spread"));
        }

        let mut config = AppConfig::default();
        config.env.reward_mean = 1e308;
        config.env.reward_spread = 1e308;
        assert_eq!(rejected_field(&config).as_deref(), Some("reward_spread"));

        let mut config = AppConfig::default();
        config.env.reward_spread = 0.0;
        assert!(config.validate().is_ok());
    }
}
