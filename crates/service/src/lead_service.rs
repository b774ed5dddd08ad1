use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use outreach_core::{Lead, NewLead, OutboundMessage, PauseReason};
use outreach_sms::normalize_e164;
use outreach_storage::StorageBackend;
use outreach_storage::traits::{LeadStore, MessageStore};

use crate::ServiceError;

/// Lead onboarding and operator remediation.
pub struct LeadService {
    storage: Arc<StorageBackend>,
}

impl LeadService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn create_lead(&self, mut input: NewLead) -> Result<Lead, ServiceError> {
        if let Some(raw) = input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            input.phone = Some(normalize_e164(raw)?);
        }
        let lead = self.storage.insert_lead(&input, Utc::now()).await?;
        tracing::info!(lead_id = %lead.id, opt_in = lead.ai_opt_in, "Lead created");
        Ok(lead)
    }

    pub async fn get_lead(&self, id: &str) -> Result<Lead, ServiceError> {
        self.storage.get_lead(id).await?.ok_or_else(|| ServiceError::lead_not_found(id))
    }

    pub async fn add_phone(
        &self,
        lead_id: &str,
        number: &str,
        is_primary: bool,
    ) -> Result<String, ServiceError> {
        let number = normalize_e164(number)?;
        self.storage.add_lead_phone(lead_id, &number, is_primary).await?;
        Ok(number)
    }

    /// Unpause and make the lead due immediately.
    pub async fn resume_sequence(&self, id: &str) -> Result<Lead, ServiceError> {
        self.storage.resume_sequence(id, Utc::now()).await?;
        tracing::info!(lead_id = id, "Sequence resumed");
        self.get_lead(id).await
    }

    pub async fn pause_sequence(&self, id: &str) -> Result<Lead, ServiceError> {
        self.storage.pause_sequence(id, PauseReason::Manual).await?;
        tracing::info!(lead_id = id, "Sequence paused by operator");
        self.get_lead(id).await
    }

    pub async fn set_opt_in(&self, id: &str, opt_in: bool) -> Result<Lead, ServiceError> {
        self.storage.set_ai_opt_in(id, opt_in).await?;
        tracing::info!(lead_id = id, opt_in, "AI opt-in updated");
        self.get_lead(id).await
    }

    /// Flag the lead as awaiting a human reply; the AI takes over after `within`.
    pub async fn request_human_response(
        &self,
        id: &str,
        within: Duration,
    ) -> Result<DateTime<Utc>, ServiceError> {
        if within <= Duration::zero() {
            return Err(ServiceError::InvalidInput("response window must be positive".to_owned()));
        }
        let deadline = Utc::now() + within;
        self.storage.request_human_response(id, deadline).await?;
        tracing::info!(lead_id = id, %deadline, "Human response requested");
        Ok(deadline)
    }

    pub async fn lead_messages(
        &self,
        id: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessage>, ServiceError> {
        Ok(self.storage.get_lead_messages(id, limit).await?)
    }
}
