use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{OutboundMessage, SmsStatus};

use crate::error::StorageError;
use crate::types::MessageStatusCounts;

/// Outbound message record operations.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Record an outbound attempt as `pending`, `sent_at = now`.
    async fn insert_outbound(
        &self,
        lead_id: &str,
        body: &str,
        is_automated: bool,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, StorageError>;

    async fn get_message(&self, id: i64) -> Result<Option<OutboundMessage>, StorageError>;

    /// Newest first.
    async fn get_lead_messages(
        &self,
        lead_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError>;

    /// The provider accepted the message; status stays `pending` until a
    /// delivery report arrives.
    async fn mark_dispatched(
        &self,
        id: i64,
        provider_message_id: &str,
    ) -> Result<(), StorageError>;

    async fn mark_message_failed(&self, id: i64, error: &str) -> Result<(), StorageError>;

    /// Apply a delivery report to a `pending` record. Records already
    /// `sent` or `failed` are left alone. Returns whether a record changed.
    async fn update_status_by_provider_id(
        &self,
        provider_message_id: &str,
        status: SmsStatus,
        error: Option<&str>,
    ) -> Result<bool, StorageError>;

    /// Mark outbound `pending` records sent before `older_than` as failed.
    async fn fail_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        error: &str,
    ) -> Result<usize, StorageError>;

    /// Failed outbound records sent at or after `since` that carry no retried
    /// marker, newest first.
    async fn find_retry_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError>;

    /// Status `sent`, error cleared.
    async fn mark_retry_succeeded(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
    ) -> Result<(), StorageError>;

    /// Append the retried marker and `error` to `sms_error`; status stays `failed`.
    async fn mark_retry_failed(&self, id: i64, error: &str) -> Result<(), StorageError>;

    /// Outbound status counts for records sent at or after `since`.
    async fn message_status_counts(
        &self,
        since: DateTime<Utc>,
    ) -> Result<MessageStatusCounts, StorageError>;
}
