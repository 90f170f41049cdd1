//! Engine configuration.

use std::time::Duration;

const ENV_PUBLISH_TIMEOUT_MS: &str = "LEDGER_PUBLISH_TIMEOUT_MS";
const ENV_POLL_TICK_MS: &str = "LEDGER_POLL_TICK_MS";
const ENV_CONSUMER_GROUP: &str = "LEDGER_CONSUMER_GROUP";

/// Tuning knobs for the publisher and the settlement workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound a publish is expected to block its caller. A tuning
    /// parameter, not a correctness requirement; exceeding it is logged.
    pub publish_timeout: Duration,
    /// How often a settlement worker wakes up to observe shutdown.
    pub poll_tick: Duration,
    /// Consumer group the settlement workers subscribe under.
    pub consumer_group: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            publish_timeout: Duration::from_secs(10),
            poll_tick: Duration::from_millis(250),
            consumer_group: "ledger-settlement".to_string(),
        }
    }
}

impl EngineConfig {
    /// Build from environment variables, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            publish_timeout: env_millis(ENV_PUBLISH_TIMEOUT_MS)
                .unwrap_or(defaults.publish_timeout),
            poll_tick: env_millis(ENV_POLL_TICK_MS).unwrap_or(defaults.poll_tick),
            consumer_group: std::env::var(ENV_CONSUMER_GROUP)
                .unwrap_or(defaults.consumer_group),
        }
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn with_poll_tick(mut self, tick: Duration) -> Self {
        self.poll_tick = tick;
        self
    }

    pub fn with_consumer_group(mut self, group: impl Into<String>) -> Self {
        self.consumer_group = group.into();
        self
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_tick, Duration::from_millis(250));
        assert_eq!(config.consumer_group, "ledger-settlement");
    }

    #[test]
    fn builders_override_fields() {
        let config = EngineConfig::default()
            .with_poll_tick(Duration::from_millis(10))
            .with_consumer_group("test-group");
        assert_eq!(config.poll_tick, Duration::from_millis(10));
        assert_eq!(config.consumer_group, "test-group");
    }
}
