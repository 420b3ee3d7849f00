//! Scheduler settings from `SCHEDULER_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SchedulerError;

/// Queue tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between queue sweeps.
    pub tick_interval: Duration,
    /// Attempts before an item is marked failed.
    pub max_attempts: u32,
    /// Delay before a failed item is retried.
    pub retry_delay: Duration,
    /// Finished items kept for inspection.
    pub retention: usize,
    /// Run the compatibility tester before publishing.
    pub auto_test: bool,
    /// Start the loop when the first item is queued.
    pub auto_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5 * 60),
            retention: 100,
            auto_test: false,
            auto_start: true,
        }
    }
}

impl SchedulerConfig {
    /// Defaults overridden by `SCHEDULER_INTERVAL_SECS`,
    /// `SCHEDULER_MAX_ATTEMPTS`, `SCHEDULER_RETRY_DELAY_SECS`,
    /// `SCHEDULER_RETENTION`, `SCHEDULER_AUTO_TEST` and `SCHEDULER_AUTO_START`.
    pub fn from_env() -> Result<Self, SchedulerError> {
        let defaults = Self::default();
        Ok(Self {
            tick_interval: env_parse::<u64>("SCHEDULER_INTERVAL_SECS")?
                .map_or(defaults.tick_interval, Duration::from_secs),
            max_attempts: env_parse("SCHEDULER_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            retry_delay: env_parse::<u64>("SCHEDULER_RETRY_DELAY_SECS")?
                .map_or(defaults.retry_delay, Duration::from_secs),
            retention: env_parse("SCHEDULER_RETENTION")?.unwrap_or(defaults.retention),
            auto_test: env_parse("SCHEDULER_AUTO_TEST")?.unwrap_or(defaults.auto_test),
            auto_start: env_parse("SCHEDULER_AUTO_START")?.unwrap_or(defaults.auto_start),
        })
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, SchedulerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| SchedulerError::Config {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
