//! MessageStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{OutboundMessage, RETRIED_MARKER, SmsStatus};

use super::{MESSAGE_COLUMNS, PgStorage, expect_message_updated, row_to_message, usize_to_i64};
use crate::error::StorageError;
use crate::traits::MessageStore;
use crate::types::MessageStatusCounts;

fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl MessageStore for PgStorage {
    async fn insert_outbound(
        &self,
        lead_id: &str,
        body: &str,
        is_automated: bool,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, StorageError> {
        let row = sqlx::query(&format!(
            "INSERT INTO conversations (lead_id, direction, body, sms_status, sent_at, is_automated)
             VALUES ($1, 'out', $2, 'pending', $3, $4)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(lead_id)
        .bind(body)
        .bind(now)
        .bind(is_automated)
        .fetch_one(&self.pool)
        .await?;
        row_to_message(&row)
    }

    async fn get_message(&self, id: i64) -> Result<Option<OutboundMessage>, StorageError> {
        let row =
            sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM conversations WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|r| row_to_message(&r)).transpose()
    }

    async fn get_lead_messages(
        &self,
        lead_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM conversations
             WHERE lead_id = $1 ORDER BY sent_at DESC, id DESC LIMIT $2"
        ))
        .bind(lead_id)
        .bind(usize_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_message).collect()
    }

    async fn mark_dispatched(
        &self,
        id: i64,
        provider_message_id: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE conversations SET provider_message_id = $2 WHERE id = $1")
            .bind(id)
            .bind(provider_message_id)
            .execute(&self.pool)
            .await?;
        expect_message_updated(result.rows_affected(), id)
    }

    async fn mark_message_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE conversations SET sms_status = 'failed', sms_error = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        expect_message_updated(result.rows_affected(), id)
    }

    async fn update_status_by_provider_id(
        &self,
        provider_message_id: &str,
        status: SmsStatus,
        error: Option<&str>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE conversations
             SET sms_status = $2,
                 sms_error = COALESCE($3, CASE WHEN $2 = 'sent' THEN NULL ELSE sms_error END)
             WHERE provider_message_id = $1 AND sms_status = 'pending'",
        )
        .bind(provider_message_id)
        .bind(status.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fail_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        error: &str,
    ) -> Result<usize, StorageError> {
        let result = sqlx::query(
            "UPDATE conversations SET sms_status = 'failed', sms_error = $2
             WHERE direction = 'out' AND sms_status = 'pending' AND sent_at < $1",
        )
        .bind(older_than)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }

    async fn find_retry_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM conversations
             WHERE direction = 'out'
               AND sms_status = 'failed'
               AND sent_at >= $1
               AND (sms_error IS NULL OR strpos(sms_error, $3) = 0)
             ORDER BY sent_at DESC, id DESC
             LIMIT $2"
        ))
        .bind(since)
        .bind(usize_to_i64(limit))
        .bind(RETRIED_MARKER)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_message).collect()
    }

    async fn mark_retry_succeeded(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE conversations
             SET sms_status = 'sent',
                 sms_error = NULL,
                 provider_message_id = COALESCE($2, provider_message_id)
             WHERE id = $1",
        )
        .bind(id)
        .bind(provider_message_id)
        .execute(&self.pool)
        .await?;
        expect_message_updated(result.rows_affected(), id)
    }

    async fn mark_retry_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE conversations
             SET sms_status = 'failed',
                 sms_error = CASE
                     WHEN sms_error IS NULL OR TRIM(sms_error) = '' THEN $3 || ' ' || $2
                     ELSE TRIM(sms_error) || ' | ' || $3 || ' ' || $2
                 END
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(RETRIED_MARKER)
        .execute(&self.pool)
        .await?;
        expect_message_updated(result.rows_affected(), id)
    }

    async fn message_status_counts(
        &self,
        since: DateTime<Utc>,
    ) -> Result<MessageStatusCounts, StorageError> {
        let (sent, failed, pending): (i64, i64, i64) = sqlx::query_as(
            "SELECT
               COUNT(*) FILTER (WHERE sms_status = 'sent'),
               COUNT(*) FILTER (WHERE sms_status = 'failed'),
               COUNT(*) FILTER (WHERE sms_status = 'pending')
             FROM conversations
             WHERE direction = 'out' AND sent_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(MessageStatusCounts {
            sent: count_to_u64(sent),
            failed: count_to_u64(failed),
            pending: count_to_u64(pending),
        })
    }
}
