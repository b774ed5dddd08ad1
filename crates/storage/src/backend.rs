//! Unified storage backend with enum dispatch.

#[cfg(feature = "sqlite")]
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{AiStage, Lead, NewLead, OutboundMessage, PauseReason, SmsStatus};

use crate::error::StorageError;
use crate::traits::{LeadStore, MessageStore};
use crate::types::MessageStatusCounts;

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::Storage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_storage::PgStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::Storage),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    /// # Errors
    /// Returns error if the database cannot be opened or migrated.
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(db_path: &Path) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::Storage::new(db_path)?))
    }

    /// # Errors
    /// Returns error if the database cannot be reached or migrated.
    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match *self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

// ── LeadStore ────────────────────────────────────────────────────

#[async_trait]
impl LeadStore for StorageBackend {
    async fn insert_lead(&self, input: &NewLead, now: DateTime<Utc>) -> Result<Lead, StorageError> {
        dispatch!(self, LeadStore, insert_lead(input, now))
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StorageError> {
        dispatch!(self, LeadStore, get_lead(id))
    }

    async fn add_lead_phone(
        &self,
        lead_id: &str,
        number: &str,
        is_primary: bool,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, add_lead_phone(lead_id, number, is_primary))
    }

    async fn get_primary_phone(&self, lead_id: &str) -> Result<Option<String>, StorageError> {
        dispatch!(self, LeadStore, get_primary_phone(lead_id))
    }

    async fn find_due_leads(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        dispatch!(self, LeadStore, find_due_leads(now, limit))
    }

    async fn claim_scheduled_send(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        dispatch!(self, LeadStore, claim_scheduled_send(id, expected))
    }

    async fn record_send_success(
        &self,
        id: &str,
        next_stage: AiStage,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, record_send_success(id, next_stage, next_send_at))
    }

    async fn pause_sequence(&self, id: &str, reason: PauseReason) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, pause_sequence(id, reason))
    }

    async fn reschedule_after_error(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
        reason: PauseReason,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, reschedule_after_error(id, retry_at, reason))
    }

    async fn find_takeover_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        dispatch!(self, LeadStore, find_takeover_due(now, limit))
    }

    async fn claim_takeover(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        dispatch!(self, LeadStore, claim_takeover(id, expected))
    }

    async fn complete_takeover(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, complete_takeover(id, next_send_at))
    }

    async fn reschedule_takeover(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, reschedule_takeover(id, retry_at))
    }

    async fn request_human_response(
        &self,
        id: &str,
        deadline: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, request_human_response(id, deadline))
    }

    async fn resume_sequence(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, resume_sequence(id, next_send_at))
    }

    async fn set_ai_opt_in(&self, id: &str, opt_in: bool) -> Result<(), StorageError> {
        dispatch!(self, LeadStore, set_ai_opt_in(id, opt_in))
    }
}

// ── MessageStore ─────────────────────────────────────────────────

#[async_trait]
impl MessageStore for StorageBackend {
    async fn insert_outbound(
        &self,
        lead_id: &str,
        body: &str,
        is_automated: bool,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, StorageError> {
        dispatch!(self, MessageStore, insert_outbound(lead_id, body, is_automated, now))
    }

    async fn get_message(&self, id: i64) -> Result<Option<OutboundMessage>, StorageError> {
        dispatch!(self, MessageStore, get_message(id))
    }

    async fn get_lead_messages(
        &self,
        lead_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        dispatch!(self, MessageStore, get_lead_messages(lead_id, limit))
    }

    async fn mark_dispatched(
        &self,
        id: i64,
        provider_message_id: &str,
    ) -> Result<(), StorageError> {
        dispatch!(self, MessageStore, mark_dispatched(id, provider_message_id))
    }

    async fn mark_message_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        dispatch!(self, MessageStore, mark_message_failed(id, error))
    }

    async fn update_status_by_provider_id(
        &self,
        provider_message_id: &str,
        status: SmsStatus,
        error: Option<&str>,
    ) -> Result<bool, StorageError> {
        dispatch!(self, MessageStore, update_status_by_provider_id(provider_message_id, status, error))
    }

    async fn fail_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        error: &str,
    ) -> Result<usize, StorageError> {
        dispatch!(self, MessageStore, fail_stale_pending(older_than, error))
    }

    async fn find_retry_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, StorageError> {
        dispatch!(self, MessageStore, find_retry_candidates(since, limit))
    }

    async fn mark_retry_succeeded(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
    ) -> Result<(), StorageError> {
        dispatch!(self, MessageStore, mark_retry_succeeded(id, provider_message_id))
    }

    async fn mark_retry_failed(&self, id: i64, error: &str) -> Result<(), StorageError> {
        dispatch!(self, MessageStore, mark_retry_failed(id, error))
    }

    async fn message_status_counts(
        &self,
        since: DateTime<Utc>,
    ) -> Result<MessageStatusCounts, StorageError> {
        dispatch!(self, MessageStore, message_status_counts(since))
    }
}
