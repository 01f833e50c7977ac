//! Jittered exponential backoff between rebind attempts

use std::time::Duration;

use tether_core::config::BackoffConfig;

/// Exponential backoff with jitter.
///
/// Jitter spreads rebind attempts out so a burst of clients does not hammer
/// a freshly restarted service in lockstep.
pub struct ExponentialBackoff {
    /// Delay the schedule restarts from
    initial: Duration,
    /// Next base delay
    current: Duration,
    /// Cap on the base delay
    max: Duration,
    /// Growth factor per attempt
    multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    jitter: f64,
}

impl ExponentialBackoff {
    /// Build a backoff from configuration
    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.initial, config.max, config.multiplier, config.jitter)
    }

    /// Build a backoff with explicit parameters
    pub fn new(initial: Duration, max: Duration, multiplier: f64, jitter: f64) -> Self {
        Self {
            initial,
            current: initial,
            max,
            multiplier,
            jitter,
        }
    }

    /// Get the next delay and advance the schedule
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;

        let grown = Duration::from_secs_f64(self.current.as_secs_f64() * self.multiplier);
        self.current = std::cmp::min(grown, self.max);

        let jitter = base.as_secs_f64() * self.jitter * rand::random::<f64>();
        base + Duration::from_secs_f64(jitter)
    }

    /// Restart the schedule from the initial delay (after a successful
    /// connect)
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
