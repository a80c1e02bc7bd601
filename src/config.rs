//! Environment-driven configuration for the lifecycle core's few
//! tunables. Wire constants (`HEADER_SIZE`, `PROTOCOL_VERSION`) are fixed
//! by the framing contract and are not configurable.

use std::time::Duration;

use crate::component::DEFAULT_INTERVAL;

/// `LIFECYCLE_DEFAULT_INTERVAL_SECS` overrides the default Component
/// update interval. Loaded via `dotenvy` first, so a `.env` file in the
/// working directory is honored the same way as a real environment
/// variable.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub default_interval: Duration,
}

impl TimerConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let secs = std::env::var("LIFECYCLE_DEFAULT_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());
        match secs {
            Some(secs) if secs > 0 => Self {
                default_interval: Duration::from_secs(secs),
            },
            _ => Self::default(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_interval: DEFAULT_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_second() {
        assert_eq!(TimerConfig::default().default_interval, Duration::from_secs(1));
    }
}
