use std::sync::Arc;

use chrono::Utc;
use outreach_core::{OutboundMessage, SenderProfile, SmsStatus};
use outreach_storage::StorageBackend;
use outreach_storage::traits::{LeadStore, MessageStore};

use crate::ServiceError;
use crate::collaborators::{OutboundChannel, OutboundRequest};

/// Send pipeline: record the attempt, hand it to the channel, track the outcome.
pub struct MessagingService {
    storage: Arc<StorageBackend>,
    channel: Arc<dyn OutboundChannel>,
}

impl MessagingService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, channel: Arc<dyn OutboundChannel>) -> Self {
        Self { storage, channel }
    }

    /// Send `body` to the lead's primary phone.
    ///
    /// The record stays `pending` after the provider accepts it; the delivery
    /// webhook moves it to `sent` or `failed`. A channel error marks the
    /// record `failed` and is returned. Once the provider has accepted the
    /// message the call succeeds even if storing the provider id fails.
    pub async fn send_message(
        &self,
        lead_id: &str,
        body: &str,
        sender: SenderProfile,
        is_automated: bool,
    ) -> Result<OutboundMessage, ServiceError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ServiceError::InvalidInput("message body is empty".to_owned()));
        }
        let to = self
            .storage
            .get_primary_phone(lead_id)
            .await?
            .ok_or_else(|| ServiceError::NoPhoneNumber(lead_id.to_owned()))?;

        let mut record = self.storage.insert_outbound(lead_id, body, is_automated, Utc::now()).await?;
        let request = OutboundRequest {
            lead_id: lead_id.to_owned(),
            to,
            body: body.to_owned(),
            sender,
            is_automated,
        };

        match self.channel.send(&request).await {
            Ok(receipt) => {
                if let Err(e) =
                    self.storage.mark_dispatched(record.id, &receipt.provider_message_id).await
                {
                    tracing::error!(
                        lead_id,
                        message_id = record.id,
                        provider_message_id = %receipt.provider_message_id,
                        error = %e,
                        "Provider accepted message but its id was not stored"
                    );
                }
                tracing::info!(
                    lead_id,
                    message_id = record.id,
                    provider_message_id = %receipt.provider_message_id,
                    "Message handed to SMS provider"
                );
                record.provider_message_id = Some(receipt.provider_message_id);
                Ok(record)
            },
            Err(e) => {
                let reason = e.to_string();
                if let Err(store_err) = self.storage.mark_message_failed(record.id, &reason).await {
                    tracing::error!(
                        message_id = record.id,
                        error = %store_err,
                        "Failed to record send failure"
                    );
                }
                tracing::warn!(lead_id, message_id = record.id, error = %reason, "SMS send failed");
                Err(e.into())
            },
        }
    }

    /// Apply a provider delivery report to a `pending` record.
    ///
    /// Returns whether a record changed. Reports for records already `sent`
    /// or `failed` are dropped, so a late callback cannot reopen a record the
    /// sweep has retried.
    pub async fn apply_delivery_status(
        &self,
        provider_message_id: &str,
        status: SmsStatus,
        error: Option<&str>,
    ) -> Result<bool, ServiceError> {
        let matched =
            self.storage.update_status_by_provider_id(provider_message_id, status, error).await?;
        if matched {
            tracing::debug!(provider_message_id, %status, "Delivery status applied");
        } else {
            tracing::warn!(
                provider_message_id,
                %status,
                "Delivery status matched no pending message, ignoring"
            );
        }
        Ok(matched)
    }
}
