//! Dispatch configuration.

use std::time::Duration;

use crate::domain::{LeakLockError, Result};

/// Default per-attempt delivery timeout.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for outbound delivery attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound for a single POST, connect through response headers
    pub delivery_timeout: Duration,
    /// `User-Agent` header sent to targets
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            user_agent: format!("leaklock/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DispatchConfig {
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - LEAKLOCK_DELIVERY_TIMEOUT_SECS (optional, default: 10)
    /// - LEAKLOCK_USER_AGENT (optional, default: "leaklock/<version>")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("LEAKLOCK_DELIVERY_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                LeakLockError::Config(format!(
                    "LEAKLOCK_DELIVERY_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            if secs == 0 {
                return Err(LeakLockError::Config(
                    "LEAKLOCK_DELIVERY_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config.delivery_timeout = Duration::from_secs(secs);
        }

        if let Some(agent) = lookup("LEAKLOCK_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }

        Ok(config)
    }
}
