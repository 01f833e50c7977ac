//! Subscription client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::types::SubscriberId;

/// Configuration for the subscription client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Identity this client registers under.
    ///
    /// Reusing an identity overwrites the previous registration at the
    /// remote service, so keep it unique per installed client.
    pub identity: SubscriberId,

    /// Rebind automatically after the transport drops the link
    pub auto_rebind: bool,

    /// Backoff configuration for rebind attempts
    pub backoff: BackoffConfig,

    /// How long a registration call may stay in flight before it is treated
    /// as a transport fault
    #[serde(with = "duration_secs")]
    pub registration_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            identity: SubscriberId::new("tether-client"),
            auto_rebind: true,
            backoff: BackoffConfig::default(),
            registration_timeout: Duration::from_secs(30),
        }
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Initial delay
    #[serde(with = "duration_secs")]
    pub initial: Duration,

    /// Maximum delay
    #[serde(with = "duration_secs")]
    pub max: Duration,

    /// Multiplier for each retry
    pub multiplier: f64,

    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.identity.as_str(), "tether-client");
        assert!(config.auto_rebind);
        assert_eq!(config.registration_timeout, Duration::from_secs(30));
        assert_eq!(config.backoff.initial, Duration::from_secs(1));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            identity = "com.example.watcher"
            auto_rebind = false
            "#,
        )
        .expect("parse");

        assert_eq!(config.identity.as_str(), "com.example.watcher");
        assert!(!config.auto_rebind);
        // untouched fields come from Default
        assert_eq!(config.registration_timeout, Duration::from_secs(30));
    }
}
