use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Negotiator tuning. Missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiatorConfig {
    /// Upper bound on one idle wait of the message loop.
    pub poll_interval_ms: u64,
    /// Random deals scored per round when the advisor is unavailable.
    pub local_search_attempts: usize,
    /// On a plan-value tie, accept only from a power at least this many
    /// supply centers behind us.
    pub weaker_margin: usize,
    /// Seed for the deal generator.
    pub seed: u64,
    pub random_deal: RandomDealConfig,
}

impl NegotiatorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            local_search_attempts: 10,
            weaker_margin: 2,
            seed: 0,
            random_deal: RandomDealConfig::default(),
        }
    }
}

/// Shape of deals drawn by the random generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomDealConfig {
    pub dmz_count: usize,
    pub provinces_per_dmz: usize,
    pub order_count: usize,
}

impl Default for RandomDealConfig {
    fn default() -> Self {
        Self {
            dmz_count: 3,
            provinces_per_dmz: 3,
            order_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NegotiatorConfig::default();
        assert_eq!(config.local_search_attempts, 10);
        assert_eq!(config.weaker_margin, 2);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.random_deal.dmz_count, 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            NegotiatorConfig::from_json(r#"{"seed": 42, "random_deal": {"order_count": 1}}"#)
                .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.random_deal.order_count, 1);
        assert_eq!(config.random_deal.dmz_count, 3);
        assert_eq!(config.poll_interval_ms, 50);
    }

    #[test]
    fn test_invalid_json() {
        assert!(NegotiatorConfig::from_json("{\"seed\": \"abc\"}").is_err());
    }
}
