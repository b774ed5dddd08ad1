//! Async trait implementations for SQLite `Storage` via `spawn_blocking`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{AiStage, Lead, NewLead, OutboundMessage, PauseReason, SmsStatus};

use crate::Storage;
use crate::error::StorageError;
use crate::traits::{LeadStore, MessageStore};
use crate::types::MessageStatusCounts;

/// Helper: run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Blocking(format!("spawn_blocking join error: {e}")))?
}

/// Body-generating macro for async-to-blocking delegation.
///
/// Each argument is annotated with a capture kind:
/// - `@ref arg`: `.clone()` a `&T`, pass as `&arg`
/// - `@str arg`: `.to_owned()` a `&str`, pass as `&arg`
/// - `@opt_str arg`: `.map(ToOwned::to_owned)` an `Option<&str>`, pass as `arg.as_deref()`
/// - `@val arg`: move directly (Copy/owned types)
macro_rules! delegate {
    ($self:ident, $method:ident $(, @$kind:ident $arg:ident)*) => {{
        let s = $self.clone();
        $(delegate!(@capture $kind $arg);)*
        blocking(move || s.$method($(delegate!(@pass $kind $arg)),*)).await
    }};
    (@capture ref $arg:ident) => { let $arg = $arg.clone(); };
    (@capture str $arg:ident) => { let $arg = $arg.to_owned(); };
    (@capture opt_str $arg:ident) => { let $arg = $arg.map(ToOwned::to_owned); };
    (@capture val $arg:ident) => { };
    (@pass ref $arg:ident) => { &$arg };
    (@pass str $arg:ident) => { &$arg };
    (@pass opt_str $arg:ident) => { $arg.as_deref() };
    (@pass val $arg:ident) => { $arg };
}

// ── LeadStore ────────────────────────────────────────────────────

#[async_trait]
impl LeadStore for Storage {
    async fn insert_lead(&self, input: &NewLead, now: DateTime<Utc>) -> Result<Lead, StorageError> {
        delegate!(self, insert_lead, @ref input, @val now)
    }
    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StorageError> {
        delegate!(self, get_lead, @str id)
    }
    async fn add_lead_phone(
        &self,
        lead_id: &str,
        number: &str,
        is_primary: bool,
    ) -> Result<(), StorageError> {
        delegate!(self, add_lead_phone, @str lead_id, @str number, @val is_primary)
    }
    async fn get_primary_phone(&self, lead_id: &str) -> Result<Option<String>, StorageError> {
        delegate!(self, get_primary_phone, @str lead_id)
    }
    async fn find_due_leads(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        delegate!(self, find_due_leads, @val now, @val limit)
    }
    async fn claim_scheduled_send(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        delegate!(self, claim_scheduled_send, @str id, @val expected)
    }
    async fn record_send_success(
        &self,
        id: &str,
        next_stage: AiStage,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        delegate!(self, record_send_success, @str id, @val next_stage, @val next_send_at)
    }
    async fn pause_sequence(&self, id: &str, reason: PauseReason) -> Result<(), StorageError> {
        delegate!(self, pause_sequence, @str id, @val reason)
    }
    async fn reschedule_after_error(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
        reason: PauseReason,
    ) -> Result<(), StorageError> {
        delegate!(self, reschedule_after_error, @str id, @val retry_at, @val reason)
    }
    async fn find_takeover_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        delegate!(self, find_takeover_due, @val now, @val limit)
    }
    async fn claim_takeover(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        delegate!(self, claim_takeover, @str id, @val expected)
    }
    async fn complete_takeover(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        delegate!(self, complete_takeover, @str id, @val next_send_at)
    }
    async fn reschedule_takeover(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        delegate!(self, reschedule_takeover, @str id, @val retry_at)
    }
    async fn request_human_response(
        &self,
        id: &str,
        deadline: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        delegate!(self, request_human_response, @str id, @val deadline)
    }
    async fn resume_sequence(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        delegate!(self, resume_sequence, @str id, @val next_send_at)
    }
    async fn set_ai_opt_in(&self, id: &str, opt_in: bool) -> Result<(), StorageError> {
        delegate!(self, set_ai_opt_in, @str id, @val opt_in)
    }
}

// ── MessageStore ─────────────────────────────────────────────────

#[async_trait]
impl MessageStore for Storage {
    async fn insert_outbound(
        &self,
        lead_id: &str,
        body: &str,
        is_automated: bool,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, StorageError> {
        delegate!(self, insert_outbound, @str lead_id, @str body, @val is_automated, @val now)
    }
    async fn get_message(&self, id: i64) -> Result<Option<OutboundMessage>, StorageError> {
        delegate!(self, get_message, @val id)
    }
    async fn get_lead_messages(
        &self,
        lead_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        delegate!(self, get_lead_messages, @str lead_id, @val limit)
    }
    async fn mark_dispatched(
        &self,
        id: i64,
        provider_message_id: &str,
    ) -> Result<(), StorageError> {
        delegate!(self, mark_dispatched, @val id, @str provider_message_id)
    }
    async fn mark_message_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        delegate!(self, mark_message_failed, @val id, @str error)
    }
    async fn update_status_by_provider_id(
        &self,
        provider_message_id: &str,
        status: SmsStatus,
        error: Option<&str>,
    ) -> Result<bool, StorageError> {
        delegate!(self, update_status_by_provider_id, @str provider_message_id, @val status, @opt_str error)
    }
    async fn fail_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        error: &str,
    ) -> Result<usize, StorageError> {
        delegate!(self, fail_stale_pending, @val older_than, @str error)
    }
    async fn find_retry_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        delegate!(self, find_retry_candidates, @val since, @val limit)
    }
    async fn mark_retry_succeeded(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
    ) -> Result<(), StorageError> {
        delegate!(self, mark_retry_succeeded, @val id, @opt_str provider_message_id)
    }
    async fn mark_retry_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        delegate!(self, mark_retry_failed, @val id, @str error)
    }
    async fn message_status_counts(
        &self,
        since: DateTime<Utc>,
    ) -> Result<MessageStatusCounts, StorageError> {
        delegate!(self, message_status_counts, @val since)
    }
}
