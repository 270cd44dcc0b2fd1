// ABOUTME: Exponential backoff configuration for transient analysis failures
// ABOUTME: Delay grows per attempt with an upper cap; knobs are env-overridable
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;
use tracing::warn;

/// Environment override for the retry attempt bound
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "RETRY_MAX_ATTEMPTS";
/// Environment override for the base delay in milliseconds
pub const ENV_RETRY_BASE_DELAY_MS: &str = "RETRY_BASE_DELAY_MS";
/// Environment override for the delay cap in milliseconds
pub const ENV_RETRY_MAX_DELAY_MS: &str = "RETRY_MAX_DELAY_MS";

/// Backoff policy for transient analysis failures.
///
/// The delay before retry `n` (1-based) is `base_delay * 2^n`, capped at
/// `max_delay`, so successive delays are monotonically non-decreasing.
#[derive(Debug, Clone)]
pub struct RetryBackoffConfig {
    /// Total attempts before giving up (first try included)
    pub max_attempts: u32,
    /// Base delay fed into the exponential growth
    pub base_delay: Duration,
    /// Upper cap on any single delay
    pub max_delay: Duration,
}

impl Default for RetryBackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryBackoffConfig {
    /// Build the policy from environment overrides, defaulting each knob
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_parse(ENV_RETRY_MAX_ATTEMPTS, defaults.max_attempts),
            base_delay: Duration::from_millis(env_parse(
                ENV_RETRY_BASE_DELAY_MS,
                defaults.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(env_parse(
                ENV_RETRY_MAX_DELAY_MS,
                defaults.max_delay.as_millis() as u64,
            )),
        }
    }

    /// Delay to sleep before retry number `attempt` (1-based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Parse an env override, keeping the default on absence or parse failure
fn env_parse<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {name} value: {raw}");
            default
        }),
        Err(_) => default,
    }
}
