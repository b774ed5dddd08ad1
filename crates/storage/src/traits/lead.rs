use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{AiStage, Lead, NewLead, PauseReason};

use crate::error::StorageError;

/// Lead store operations used by the scheduler loop and operators.
///
/// Every mutation addressed at a single lead returns `StorageError::NotFound`
/// when the lead does not exist, except the `claim_*` operations which report
/// a lost claim as `Ok(false)`.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Onboard a lead; a supplied phone number becomes its primary number.
    async fn insert_lead(&self, input: &NewLead, now: DateTime<Utc>)
    -> Result<Lead, StorageError>;

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StorageError>;

    /// Attach a phone number. A new primary number demotes the previous one.
    async fn add_lead_phone(
        &self,
        lead_id: &str,
        number: &str,
        is_primary: bool,
    ) -> Result<(), StorageError>;

    async fn get_primary_phone(&self, lead_id: &str) -> Result<Option<String>, StorageError>;

    /// Leads eligible for their next automated message at `now`.
    ///
    /// Opted in, not paused, no human reply owed, `next_ai_send_at <= now`.
    /// Ordered by `next_ai_send_at`, then id.
    async fn find_due_leads(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError>;

    /// Clear `next_ai_send_at` only if it still equals `expected`.
    ///
    /// Returns whether this caller won the claim.
    async fn claim_scheduled_send(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Count the send, advance the stage and schedule the next send.
    async fn record_send_success(
        &self,
        id: &str,
        next_stage: AiStage,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Pause the sequence. `next_ai_send_at` is left as-is.
    async fn pause_sequence(&self, id: &str, reason: PauseReason) -> Result<(), StorageError>;

    /// Push the next send out and record why, without pausing.
    async fn reschedule_after_error(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
        reason: PauseReason,
    ) -> Result<(), StorageError>;

    /// Leads whose owed human reply is past its deadline.
    async fn find_takeover_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError>;

    /// Clear `human_response_deadline` only if it still equals `expected`.
    async fn claim_takeover(&self, id: &str, expected: DateTime<Utc>)
    -> Result<bool, StorageError>;

    /// Clear the owed-reply flags, count the send and resume the schedule.
    async fn complete_takeover(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Re-arm the takeover deadline after a failed takeover send.
    async fn reschedule_takeover(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Flag the lead as awaiting a human reply until `deadline`.
    async fn request_human_response(
        &self,
        id: &str,
        deadline: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Unpause, clear the pause reason and schedule the next send.
    async fn resume_sequence(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Opting out also pauses the sequence with `opted_out`.
    async fn set_ai_opt_in(&self, id: &str, opt_in: bool) -> Result<(), StorageError>;
}
