//! Environment-driven startup configuration
//!
//! A single immutable [`Config`] is assembled once at process startup and handed
//! to every evaluator as a read-only view. There is no global mutable singleton;
//! callers thread an `Arc<Config>` (or a plain `Config`, it is `Copy`-free but cheap
//! to clone) through the types that need it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Thresholds, Weights};

/// Recognized environment variables, exactly the options enumerated in the
/// external-interfaces configuration section.
const ENV_USE_LOCAL_MOCKS: &str = "GOVERNANCE_USE_LOCAL_MOCKS";
const ENV_AUTO_APPROVE_THRESHOLD: &str = "GOVERNANCE_AUTO_APPROVE_THRESHOLD";
const ENV_HUMAN_REVIEW_THRESHOLD: &str = "GOVERNANCE_HUMAN_REVIEW_THRESHOLD";
const ENV_WEIGHT_INFRA: &str = "GOVERNANCE_WEIGHT_INFRA";
const ENV_WEIGHT_POLICY: &str = "GOVERNANCE_WEIGHT_POLICY";
const ENV_WEIGHT_HISTORICAL: &str = "GOVERNANCE_WEIGHT_HISTORICAL";
const ENV_WEIGHT_COST: &str = "GOVERNANCE_WEIGHT_COST";
const ENV_EVALUATOR_TIMEOUT_SECONDS: &str = "GOVERNANCE_EVALUATOR_TIMEOUT_SECONDS";
const ENV_MAX_CONCURRENT_EVALUATIONS: &str = "GOVERNANCE_MAX_CONCURRENT_EVALUATIONS";
const ENV_SERVER_URL: &str = "GOVERNANCE_SERVER_URL";

/// Immutable startup configuration, validated once and never mutated afterward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `true` ⇒ file-backed stores; `false` ⇒ remote stores
    pub use_local_mocks: bool,

    pub thresholds: Thresholds,
    pub weights: Weights,

    pub evaluator_timeout_seconds: u64,
    pub max_concurrent_evaluations: usize,

    /// Advertised `url` field in the Surface A capability card
    pub server_url: String,
}

impl Config {
    /// Assemble configuration from environment variables, applying the defaults
    /// named in the external-interfaces configuration section where a variable
    /// is unset.
    ///
    /// Returns `ConfigError` (never a silent clamp) if weights do not sum to
    /// 1.0 within `1e-9`, or if `auto_approve_threshold > human_review_threshold`.
    pub fn from_env() -> Result<Self> {
        let use_local_mocks = read_bool(ENV_USE_LOCAL_MOCKS, true)?;

        let thresholds = Thresholds {
            auto_approve: read_f64(ENV_AUTO_APPROVE_THRESHOLD, 25.0)?,
            human_review: read_f64(ENV_HUMAN_REVIEW_THRESHOLD, 60.0)?,
        };

        let defaults = Weights::default_weights();
        let weights = Weights {
            infra: read_f64(ENV_WEIGHT_INFRA, defaults.infra)?,
            policy: read_f64(ENV_WEIGHT_POLICY, defaults.policy)?,
            historical: read_f64(ENV_WEIGHT_HISTORICAL, defaults.historical)?,
            cost: read_f64(ENV_WEIGHT_COST, defaults.cost)?,
        };

        let evaluator_timeout_seconds = read_u64(ENV_EVALUATOR_TIMEOUT_SECONDS, 10)?;
        let max_concurrent_evaluations = read_u64(ENV_MAX_CONCURRENT_EVALUATIONS, 64)? as usize;

        let server_url = std::env::var(ENV_SERVER_URL)
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let config = Self {
            use_local_mocks,
            thresholds,
            weights,
            evaluator_timeout_seconds,
            max_concurrent_evaluations,
            server_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Re-validate an already-constructed config, e.g. one built directly by tests
    pub fn validate(&self) -> Result<()> {
        if !self.weights.is_valid() {
            return Err(Error::config(format!(
                "weights must sum to 1.0 within 1e-9, got {} (infra={}, policy={}, historical={}, cost={})",
                self.weights.sum(),
                self.weights.infra,
                self.weights.policy,
                self.weights.historical,
                self.weights.cost
            )));
        }
        if !self.thresholds.is_valid() {
            return Err(Error::config(format!(
                "auto_approve_threshold ({}) must be <= human_review_threshold ({})",
                self.thresholds.auto_approve, self.thresholds.human_review
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_local_mocks: true,
            thresholds: Thresholds::default_thresholds(),
            weights: Weights::default_weights(),
            evaluator_timeout_seconds: 10,
            max_concurrent_evaluations: 64,
            server_url: "http://localhost:8080".to_string(),
        }
    }
}

fn read_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<bool>()
            .map_err(|_| Error::config(format!("{key} must be \"true\" or \"false\", got \"{raw}\""))),
        Err(_) => Ok(default),
    }
}

fn read_f64(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::config(format!("{key} must be a number, got \"{raw}\""))),
        Err(_) => Ok(default),
    }
}

fn read_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::config(format!("{key} must be a non-negative integer, got \"{raw}\""))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn mismatched_weights_reject() {
        let mut config = Config::default();
        config.weights.cost += 0.05;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn inverted_thresholds_reject() {
        let mut config = Config::default();
        config.thresholds.auto_approve = 70.0;
        config.thresholds.human_review = 60.0;
        assert!(config.validate().is_err());
    }
}
