//! Environment-driven configuration for the scheduler loop and maintenance sweep.

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_RETRY_LIMIT, DEFAULT_TICK_SECS, HEALTH_WINDOW_HOURS,
    PROCESSING_ERROR_RETRY_SECS, RETRY_LOOKBACK_MINUTES, STALE_PENDING_MINUTES,
};
use crate::env_config::env_parse_with_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Leads processed per tick.
    pub batch_size: usize,
    /// Interval between ticks of the background loop.
    pub tick_interval: StdDuration,
    /// Delay before a lead that hit a processing error is due again.
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            tick_interval: StdDuration::from_secs(DEFAULT_TICK_SECS),
            retry_delay: Duration::seconds(PROCESSING_ERROR_RETRY_SECS),
        }
    }
}

impl SchedulerConfig {
    /// Reads `OUTREACH_BATCH_SIZE`, `OUTREACH_TICK_SECS`, `OUTREACH_RETRY_DELAY_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let batch_size = env_parse_with_default("OUTREACH_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);
        let tick_secs = env_parse_with_default("OUTREACH_TICK_SECS", DEFAULT_TICK_SECS).max(1);
        let retry_secs =
            env_parse_with_default("OUTREACH_RETRY_DELAY_SECS", PROCESSING_ERROR_RETRY_SECS).max(1);
        Self {
            batch_size,
            tick_interval: StdDuration::from_secs(tick_secs),
            retry_delay: Duration::seconds(retry_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceConfig {
    /// Pending messages older than this are marked failed.
    pub stale_pending_after: Duration,
    /// Only failed messages sent within this window are retried.
    pub retry_lookback: Duration,
    /// Maximum retries per pass.
    pub retry_limit: usize,
    /// Window for the health score.
    pub health_window: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            stale_pending_after: Duration::minutes(STALE_PENDING_MINUTES),
            retry_lookback: Duration::minutes(RETRY_LOOKBACK_MINUTES),
            retry_limit: DEFAULT_RETRY_LIMIT,
            health_window: Duration::hours(HEALTH_WINDOW_HOURS),
        }
    }
}

impl MaintenanceConfig {
    /// Reads `OUTREACH_STALE_PENDING_MINS`, `OUTREACH_RETRY_LOOKBACK_MINS`,
    /// `OUTREACH_RETRY_LIMIT`, `OUTREACH_HEALTH_WINDOW_HOURS`.
    #[must_use]
    pub fn from_env() -> Self {
        let stale = env_parse_with_default("OUTREACH_STALE_PENDING_MINS", STALE_PENDING_MINUTES);
        let lookback =
            env_parse_with_default("OUTREACH_RETRY_LOOKBACK_MINS", RETRY_LOOKBACK_MINUTES);
        let retry_limit = env_parse_with_default("OUTREACH_RETRY_LIMIT", DEFAULT_RETRY_LIMIT);
        let window = env_parse_with_default("OUTREACH_HEALTH_WINDOW_HOURS", HEALTH_WINDOW_HOURS);
        Self {
            stale_pending_after: Duration::minutes(stale.max(1)),
            retry_lookback: Duration::minutes(lookback.max(1)),
            retry_limit,
            health_window: Duration::hours(window.max(1)),
        }
    }
}
