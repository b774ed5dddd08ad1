//! Shared constants for the outreach scheduler.
//!
//! Centralizes the timing windows and batch bounds used by the scheduler
//! loop and the pipeline maintenance sweep.

/// Maximum leads processed per scheduler tick.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Scheduler tick interval in seconds.
pub const DEFAULT_TICK_SECS: u64 = 30;

/// Delay before a lead that hit a processing error becomes due again.
pub const PROCESSING_ERROR_RETRY_SECS: i64 = 5 * 60;

/// Pending outbound messages older than this are marked failed.
pub const STALE_PENDING_MINUTES: i64 = 30;

/// Failed messages are only retried if they were sent within this window.
pub const RETRY_LOOKBACK_MINUTES: i64 = 60;

/// Default number of failed messages retried per maintenance pass.
pub const DEFAULT_RETRY_LIMIT: usize = 10;

/// Window over which pipeline health is computed.
pub const HEALTH_WINDOW_HOURS: i64 = 24;

/// Maximum length of a single outbound SMS body (three concatenated segments).
pub const MAX_SMS_BODY_CHARS: usize = 480;

/// Maximum number of results for any list query (DoS protection).
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Default number of results when limit is not specified by the caller.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;
