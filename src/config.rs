//! Engine configuration.
//!
//! Everything here has a sensible default; `from_env` overrides individual
//! knobs from environment variables the way the deployment sets them.

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::error::EngineError;

/// Tunable policy for the resolution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Currency assumed for bare numbers and bare `$` amounts.
    pub default_currency: String,
    /// How long a pending question stays answerable.
    pub pending_ttl: Duration,
    /// Minimum model confidence before a model intent can win the merge.
    pub model_confidence_threshold: f32,
    /// Consecutive not-understood turns before substituting a help response.
    pub unknown_escalation_turns: u8,
    /// Hard timeout for the optional model classification call.
    pub model_timeout: StdDuration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_currency: "CRC".to_string(),
            pending_ttl: Duration::minutes(10),
            model_confidence_threshold: 0.7,
            unknown_escalation_turns: 2,
            model_timeout: StdDuration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `FINCHAT_*` environment variables.
    pub fn from_env() -> Result<Self, EngineError> {
        let mut config = Self::default();

        if let Ok(currency) = std::env::var("FINCHAT_DEFAULT_CURRENCY") {
            let currency = currency.trim().to_uppercase();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(EngineError::Config(format!(
                    "FINCHAT_DEFAULT_CURRENCY must be a 3-letter code, got '{currency}'"
                )));
            }
            config.default_currency = currency;
        }

        if let Ok(secs) = std::env::var("FINCHAT_PENDING_TTL_SECS") {
            let secs: i64 = secs.parse().map_err(|_| {
                EngineError::Config(format!("FINCHAT_PENDING_TTL_SECS must be an integer, got '{secs}'"))
            })?;
            if secs <= 0 {
                return Err(EngineError::Config(
                    "FINCHAT_PENDING_TTL_SECS must be positive".to_string(),
                ));
            }
            config.pending_ttl = Duration::seconds(secs);
        }

        if let Ok(secs) = std::env::var("FINCHAT_MODEL_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                EngineError::Config(format!("FINCHAT_MODEL_TIMEOUT_SECS must be an integer, got '{secs}'"))
            })?;
            config.model_timeout = StdDuration::from_secs(secs);
        }

        Ok(config)
    }
}
