//! Serde helpers shared across configuration types

/// Serialize `std::time::Duration` as a plain number of seconds.
///
/// Keeps durations readable in TOML config files (`registration_timeout = 30`
/// rather than a nested struct).
pub mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as seconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize a Duration from seconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "duration_secs")]
        delay: Duration,
    }

    #[test]
    fn test_duration_renders_as_bare_seconds() {
        let toml = toml::to_string(&Wrapper {
            delay: Duration::from_secs(90),
        })
        .unwrap();
        assert_eq!(toml.trim(), "delay = 90");
    }

    #[test]
    fn test_duration_parses_from_bare_seconds() {
        let wrapper: Wrapper = toml::from_str("delay = 15").unwrap();
        assert_eq!(wrapper.delay, Duration::from_secs(15));
    }
}
