//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by domain concern.

#![allow(clippy::absolute_paths, reason = "std paths in error handling are clear")]

mod leads;
mod messages;

use chrono::{DateTime, Utc};
use outreach_core::{
    AiStage, Lead, MessageDirection, OutboundMessage, PG_POOL_ACQUIRE_TIMEOUT_SECS,
    PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS, PauseReason, SmsStatus,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::StorageError;

use super::pg_migrations::run_pg_migrations;

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// # Errors
    /// Returns error if the database cannot be reached or migrated.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

pub(crate) const LEAD_COLUMNS: &str = "id, first_name, last_name, vehicle_interest, ai_opt_in,
    ai_sequence_paused, ai_pause_reason, pending_human_response, human_response_deadline,
    next_ai_send_at, ai_stage, ai_messages_sent, created_at";

pub(crate) const MESSAGE_COLUMNS: &str = "id, lead_id, direction, body, sms_status, sent_at,
    sms_error, provider_message_id, is_automated";

/// Convert `usize` to `i64` for SQL LIMIT binds.
/// Saturates to `i64::MAX` on overflow (only possible on 128-bit targets).
pub(crate) fn usize_to_i64(val: usize) -> i64 {
    i64::try_from(val).unwrap_or(i64::MAX)
}

pub(crate) fn row_to_lead(row: &sqlx::postgres::PgRow) -> Result<Lead, StorageError> {
    let reason: Option<String> = row.try_get("ai_pause_reason")?;
    let stage: String = row.try_get("ai_stage")?;
    let sent: i32 = row.try_get("ai_messages_sent")?;
    Ok(Lead {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        vehicle_interest: row.try_get("vehicle_interest")?,
        ai_opt_in: row.try_get("ai_opt_in")?,
        ai_sequence_paused: row.try_get("ai_sequence_paused")?,
        ai_pause_reason: PauseReason::parse_stored(reason.as_deref()),
        pending_human_response: row.try_get("pending_human_response")?,
        human_response_deadline: row.try_get("human_response_deadline")?,
        next_ai_send_at: row.try_get("next_ai_send_at")?,
        ai_stage: AiStage::parse_lenient(&stage),
        ai_messages_sent: u32::try_from(sent).map_err(|e| StorageError::DataCorruption {
            context: format!("negative ai_messages_sent: {sent}"),
            source: Box::new(e),
        })?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

pub(crate) fn row_to_message(
    row: &sqlx::postgres::PgRow,
) -> Result<OutboundMessage, StorageError> {
    let direction: String = row.try_get("direction")?;
    let status: String = row.try_get("sms_status")?;
    Ok(OutboundMessage {
        id: row.try_get("id")?,
        lead_id: row.try_get("lead_id")?,
        direction: direction.parse().unwrap_or(MessageDirection::Out),
        body: row.try_get("body")?,
        sms_status: status.parse().unwrap_or_else(|_| {
            tracing::warn!(invalid_status = %status, "corrupt sms_status in DB, treating as failed");
            SmsStatus::Failed
        }),
        sent_at: row.try_get("sent_at")?,
        sms_error: row.try_get("sms_error")?,
        provider_message_id: row.try_get("provider_message_id")?,
        is_automated: row.try_get("is_automated")?,
    })
}

pub(crate) fn expect_lead_updated(rows: u64, id: &str) -> Result<(), StorageError> {
    if rows == 0 {
        return Err(StorageError::not_found("lead", id));
    }
    Ok(())
}

pub(crate) fn expect_message_updated(rows: u64, id: i64) -> Result<(), StorageError> {
    if rows == 0 {
        return Err(StorageError::not_found("message", id.to_string()));
    }
    Ok(())
}
