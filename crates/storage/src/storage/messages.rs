use chrono::{DateTime, Utc};
use outreach_core::{MessageDirection, OutboundMessage, RETRIED_MARKER, SmsStatus};
use rusqlite::{Connection, OptionalExtension, params};

use super::{Storage, from_millis, get_conn, log_row_error, to_millis};
use crate::error::StorageError;
use crate::types::MessageStatusCounts;

const MESSAGE_COLUMNS: &str = "id, lead_id, direction, body, sms_status, sent_at, sms_error,
    provider_message_id, is_automated";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboundMessage> {
    let direction: String = row.get(2)?;
    let status: String = row.get(4)?;
    Ok(OutboundMessage {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        direction: direction.parse().unwrap_or(MessageDirection::Out),
        body: row.get(3)?,
        sms_status: status.parse().unwrap_or_else(|_| {
            tracing::warn!(invalid_status = %status, "corrupt sms_status in DB, treating as failed");
            SmsStatus::Failed
        }),
        sent_at: from_millis(5, row.get(5)?)?,
        sms_error: row.get(6)?,
        provider_message_id: row.get(7)?,
        is_automated: row.get(8)?,
    })
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<OutboundMessage>, StorageError> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM conversations WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_message).optional()?)
}

fn expect_updated(changed: usize, id: i64) -> Result<(), StorageError> {
    if changed == 0 {
        return Err(StorageError::not_found("message", id.to_string()));
    }
    Ok(())
}

impl Storage {
    /// # Errors
    /// Returns error if database insert fails.
    pub fn insert_outbound(
        &self,
        lead_id: &str,
        body: &str,
        is_automated: bool,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO conversations (lead_id, direction, body, sms_status, sent_at, is_automated)
               VALUES (?1, 'out', ?2, 'pending', ?3, ?4)",
            params![lead_id, body, to_millis(now), is_automated],
        )?;
        let id = conn.last_insert_rowid();
        query_message(&conn, id)?.ok_or_else(|| StorageError::not_found("message", id.to_string()))
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_message(&self, id: i64) -> Result<Option<OutboundMessage>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_message(&conn, id)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_lead_messages(
        &self,
        lead_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM conversations
               WHERE lead_id = ?1 ORDER BY sent_at DESC, id DESC LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params![lead_id, limit as i64], row_to_message)?
            .filter_map(log_row_error)
            .collect();
        Ok(messages)
    }

    /// # Errors
    /// Returns `NotFound` if the message does not exist.
    pub fn mark_dispatched(&self, id: i64, provider_message_id: &str) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE conversations SET provider_message_id = ?2 WHERE id = ?1",
            params![id, provider_message_id],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the message does not exist.
    pub fn mark_message_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE conversations SET sms_status = 'failed', sms_error = ?2 WHERE id = ?1",
            params![id, error],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns error if database update fails.
    pub fn update_status_by_provider_id(
        &self,
        provider_message_id: &str,
        status: SmsStatus,
        error: Option<&str>,
    ) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE conversations
               SET sms_status = ?2,
                   sms_error = COALESCE(?3, CASE WHEN ?2 = 'sent' THEN NULL ELSE sms_error END)
               WHERE provider_message_id = ?1 AND sms_status = 'pending'",
            params![provider_message_id, status.as_str(), error],
        )?;
        Ok(changed > 0)
    }

    /// # Errors
    /// Returns error if database update fails.
    pub fn fail_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        error: &str,
    ) -> Result<usize, StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE conversations SET sms_status = 'failed', sms_error = ?2
               WHERE direction = 'out' AND sms_status = 'pending' AND sent_at < ?1",
            params![to_millis(older_than), error],
        )?;
        Ok(changed)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn find_retry_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM conversations
               WHERE direction = 'out'
                 AND sms_status = 'failed'
                 AND sent_at >= ?1
                 AND (sms_error IS NULL OR instr(sms_error, ?3) = 0)
               ORDER BY sent_at DESC, id DESC
               LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params![to_millis(since), limit as i64, RETRIED_MARKER], row_to_message)?
            .filter_map(log_row_error)
            .collect();
        Ok(messages)
    }

    /// # Errors
    /// Returns `NotFound` if the message does not exist.
    pub fn mark_retry_succeeded(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE conversations
               SET sms_status = 'sent',
                   sms_error = NULL,
                   provider_message_id = COALESCE(?2, provider_message_id)
               WHERE id = ?1",
            params![id, provider_message_id],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the message does not exist.
    pub fn mark_retry_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE conversations
               SET sms_status = 'failed',
                   sms_error = CASE
                       WHEN sms_error IS NULL OR TRIM(sms_error) = '' THEN ?3 || ' ' || ?2
                       ELSE TRIM(sms_error) || ' | ' || ?3 || ' ' || ?2
                   END
               WHERE id = ?1",
            params![id, error, RETRIED_MARKER],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn message_status_counts(
        &self,
        since: DateTime<Utc>,
    ) -> Result<MessageStatusCounts, StorageError> {
        let conn = get_conn(&self.pool)?;
        let counts = conn.query_row(
            "SELECT
               COALESCE(SUM(CASE WHEN sms_status = 'sent' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN sms_status = 'failed' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN sms_status = 'pending' THEN 1 ELSE 0 END), 0)
             FROM conversations
             WHERE direction = 'out' AND sent_at >= ?1",
            params![to_millis(since)],
            |row| {
                Ok(MessageStatusCounts {
                    sent: row.get::<_, i64>(0)? as u64,
                    failed: row.get::<_, i64>(1)? as u64,
                    pending: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;
        Ok(counts)
    }
}
