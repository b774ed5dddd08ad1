//! Pipeline maintenance sweep: time out stale pending messages, retry recent
//! failures once, and report health before and after.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use outreach_core::{MaintenanceConfig, OutboundMessage, PipelineHealth, SenderProfile};
use outreach_storage::StorageBackend;
use outreach_storage::traits::{LeadStore, MessageStore};
use serde::{Deserialize, Serialize};

use crate::ServiceError;
use crate::collaborators::{OutboundChannel, OutboundRequest};

/// Result of one sweep, serialized for operators and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub health_before: PipelineHealth,
    pub health_after: PipelineHealth,
    pub messages_retried: usize,
    pub messages_cleaned: usize,
    pub health_improvement: i16,
    pub timestamp: DateTime<Utc>,
}

enum RetryOutcome {
    Succeeded,
    Failed,
    Skipped,
}

pub struct MaintenanceSweep {
    storage: Arc<StorageBackend>,
    channel: Arc<dyn OutboundChannel>,
    config: MaintenanceConfig,
}

impl MaintenanceSweep {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        channel: Arc<dyn OutboundChannel>,
        config: MaintenanceConfig,
    ) -> Self {
        Self { storage, channel, config }
    }

    #[must_use]
    pub const fn config(&self) -> &MaintenanceConfig {
        &self.config
    }

    /// Mark pending messages with no delivery report after the stale window as failed.
    pub async fn cleanup_old_pending_messages(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, ServiceError> {
        let cutoff = now - self.config.stale_pending_after;
        let reason = format!(
            "Message timed out: no delivery status after {} minutes",
            self.config.stale_pending_after.num_minutes()
        );
        let cleaned = self.storage.fail_stale_pending(cutoff, &reason).await?;
        if cleaned > 0 {
            tracing::info!(cleaned, "Marked stale pending messages as failed");
        }
        Ok(cleaned)
    }

    /// Retry recent failed messages once each. Returns how many succeeded.
    ///
    /// A message whose lead has no primary phone is left untouched.
    pub async fn retry_failed_messages(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, ServiceError> {
        let since = now - self.config.retry_lookback;
        let candidates = self.storage.find_retry_candidates(since, limit).await?;
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for message in &candidates {
            match self.retry_one(message).await {
                Ok(RetryOutcome::Succeeded) => succeeded += 1,
                Ok(RetryOutcome::Failed) => failed += 1,
                Ok(RetryOutcome::Skipped) => {},
                Err(e) => {
                    tracing::error!(message_id = message.id, error = %e, "Retry bookkeeping failed");
                },
            }
        }

        if !candidates.is_empty() {
            tracing::info!(candidates = candidates.len(), succeeded, failed, "Retry pass complete");
        }
        Ok(succeeded)
    }

    async fn retry_one(&self, message: &OutboundMessage) -> Result<RetryOutcome, ServiceError> {
        if !message.is_retry_candidate() {
            return Ok(RetryOutcome::Skipped);
        }
        let Some(to) = self.storage.get_primary_phone(&message.lead_id).await? else {
            tracing::debug!(
                message_id = message.id,
                lead_id = %message.lead_id,
                "No primary phone, skipping retry"
            );
            return Ok(RetryOutcome::Skipped);
        };

        let request = OutboundRequest {
            lead_id: message.lead_id.clone(),
            to,
            body: message.body.clone(),
            sender: SenderProfile::System,
            is_automated: message.is_automated,
        };

        match self.channel.send(&request).await {
            Ok(receipt) => {
                self.storage
                    .mark_retry_succeeded(message.id, Some(&receipt.provider_message_id))
                    .await?;
                tracing::info!(message_id = message.id, "Retried message accepted");
                Ok(RetryOutcome::Succeeded)
            },
            Err(e) => {
                self.storage.mark_retry_failed(message.id, &e.to_string()).await?;
                tracing::warn!(message_id = message.id, error = %e, "Retry failed");
                Ok(RetryOutcome::Failed)
            },
        }
    }

    /// Outbound health over the configured window ending at `now`.
    pub async fn get_health_status(&self, now: DateTime<Utc>) -> Result<PipelineHealth, ServiceError> {
        let counts = self.storage.message_status_counts(now - self.config.health_window).await?;
        Ok(counts.health())
    }

    /// Health before, cleanup, retry, health after.
    pub async fn run_maintenance(&self, now: DateTime<Utc>) -> Result<MaintenanceReport, ServiceError> {
        let health_before = self.get_health_status(now).await?;
        let messages_cleaned = self.cleanup_old_pending_messages(now).await?;
        let messages_retried = self.retry_failed_messages(now, self.config.retry_limit).await?;
        let health_after = self.get_health_status(now).await?;
        let health_improvement = health_after.improvement_over(&health_before);

        tracing::info!(
            score_before = health_before.score,
            score_after = health_after.score,
            messages_cleaned,
            messages_retried,
            "Pipeline maintenance complete"
        );

        Ok(MaintenanceReport {
            health_before,
            health_after,
            messages_retried,
            messages_cleaned,
            health_improvement,
            timestamp: now,
        })
    }
}
