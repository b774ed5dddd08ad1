//! Scheduler loop: send each due lead its next AI-generated message.
//!
//! A lead is claimed by clearing `next_ai_send_at` with a compare-and-set
//! before the generator or the channel is called, so overlapping ticks (in
//! this process or another) issue at most one send per due time.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use outreach_core::{GeneratedMessage, Lead, PauseReason, SchedulerConfig, SenderProfile};
use outreach_storage::StorageBackend;
use outreach_storage::traits::LeadStore;
use serde::{Deserialize, Serialize};

use crate::ServiceError;
use crate::collaborators::MessageGenerator;
use crate::messaging::MessagingService;

/// In-memory guard state shared by the ticks of one scheduler instance.
///
/// Holds a tick-in-progress flag and the ids of leads being processed.
#[derive(Debug, Default)]
pub struct InFlight {
    ticking: AtomicBool,
    leads: Mutex<HashSet<String>>,
}

/// Releases the tick flag on drop.
#[derive(Debug)]
pub struct TickGuard<'a> {
    owner: &'a InFlight,
}

/// Removes a lead from the in-flight set on drop.
#[derive(Debug)]
pub struct LeadGuard<'a> {
    owner: &'a InFlight,
    lead_id: String,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if a tick is already running.
    pub fn try_begin_tick(&self) -> Option<TickGuard<'_>> {
        self.ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard { owner: self })
    }

    /// Returns `None` if the lead is already being processed.
    pub fn try_claim_lead(&self, lead_id: &str) -> Option<LeadGuard<'_>> {
        let mut leads = self.leads.lock().unwrap_or_else(|e| e.into_inner());
        leads.insert(lead_id.to_owned()).then(|| LeadGuard { owner: self, lead_id: lead_id.to_owned() })
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn leads_in_flight(&self) -> usize {
        self.leads.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.owner.ticking.store(false, Ordering::Release);
    }
}

impl Drop for LeadGuard<'_> {
    fn drop(&mut self) {
        self.owner.leads.lock().unwrap_or_else(|e| e.into_inner()).remove(&self.lead_id);
    }
}

/// Counts from one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// The pass did not run because another tick held the guard.
    pub skipped: bool,
    pub selected: usize,
    pub sent: usize,
    pub paused: usize,
    pub rescheduled: usize,
    /// Leads taken by a concurrent tick or process.
    pub contended: usize,
}

impl TickReport {
    #[must_use]
    pub fn skipped() -> Self {
        Self { skipped: true, ..Self::default() }
    }

    pub fn merge(&mut self, other: Self) {
        self.skipped &= other.skipped;
        self.selected += other.selected;
        self.sent += other.sent;
        self.paused += other.paused;
        self.rescheduled += other.rescheduled;
        self.contended += other.contended;
    }
}

enum LeadOutcome {
    Sent,
    Paused,
}

const TAKEOVER_MESSAGE: &str = "thanks for your patience! I wanted to make sure your \
question didn't slip through the cracks. A member of our team will follow up shortly, \
and I'm happy to help in the meantime. What can I answer for you?";

fn takeover_message(lead: &Lead) -> String {
    match lead.first_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {name}, {TAKEOVER_MESSAGE}"),
        None => format!("Hi there, {TAKEOVER_MESSAGE}"),
    }
}

pub struct Scheduler {
    storage: Arc<StorageBackend>,
    generator: Arc<dyn MessageGenerator>,
    messaging: Arc<MessagingService>,
    config: SchedulerConfig,
    in_flight: Arc<InFlight>,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        generator: Arc<dyn MessageGenerator>,
        messaging: Arc<MessagingService>,
        config: SchedulerConfig,
        in_flight: Arc<InFlight>,
    ) -> Self {
        Self { storage, generator, messaging, config, in_flight }
    }

    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[must_use]
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Run both scans: scheduled sends, then expired human-reply deadlines.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, ServiceError> {
        let mut report = self.process_scheduled_messages(now).await?;
        report.merge(self.process_ai_takeover_messages(now).await?);
        Ok(report)
    }

    /// Send the next message to each due lead, serially, up to the batch size.
    ///
    /// Errors for one lead never abort the batch; only the selection query
    /// can fail the pass.
    pub async fn process_scheduled_messages(
        &self,
        now: DateTime<Utc>,
    ) -> Result<TickReport, ServiceError> {
        let Some(_tick) = self.in_flight.try_begin_tick() else {
            tracing::debug!("Scheduler tick already running, skipping");
            return Ok(TickReport::skipped());
        };

        let leads = self.storage.find_due_leads(now, self.config.batch_size).await?;
        let mut report = TickReport { selected: leads.len(), ..TickReport::default() };
        if leads.is_empty() {
            return Ok(report);
        }
        tracing::info!(count = leads.len(), "Processing due leads");

        for lead in &leads {
            let Some(_lead_guard) = self.in_flight.try_claim_lead(&lead.id) else {
                report.contended += 1;
                continue;
            };
            let Some(expected) = lead.next_ai_send_at else {
                continue;
            };
            match self.storage.claim_scheduled_send(&lead.id, expected).await {
                Ok(true) => {},
                Ok(false) => {
                    tracing::debug!(lead_id = %lead.id, "Lead claimed elsewhere, skipping");
                    report.contended += 1;
                    continue;
                },
                Err(e) => {
                    tracing::error!(lead_id = %lead.id, error = %e, "Failed to claim lead");
                    continue;
                },
            }

            match self.process_lead(lead, now).await {
                Ok(LeadOutcome::Sent) => report.sent += 1,
                Ok(LeadOutcome::Paused) => report.paused += 1,
                Err(e) => {
                    let retry_at = now + self.config.retry_delay;
                    tracing::warn!(
                        lead_id = %lead.id,
                        error = %e,
                        %retry_at,
                        "Lead processing failed, rescheduling"
                    );
                    match self
                        .storage
                        .reschedule_after_error(&lead.id, retry_at, PauseReason::ProcessingError)
                        .await
                    {
                        Ok(()) => report.rescheduled += 1,
                        Err(e) => {
                            tracing::error!(lead_id = %lead.id, error = %e, "Failed to reschedule lead");
                        },
                    }
                },
            }
        }

        tracing::info!(
            selected = report.selected,
            sent = report.sent,
            paused = report.paused,
            rescheduled = report.rescheduled,
            contended = report.contended,
            "Scheduler pass complete"
        );
        Ok(report)
    }

    async fn process_lead(&self, lead: &Lead, now: DateTime<Utc>) -> Result<LeadOutcome, ServiceError> {
        match self.generator.generate(lead).await {
            GeneratedMessage::Generated(text) => {
                self.messaging.send_message(&lead.id, &text, SenderProfile::AiAssistant, true).await?;
                let next_at = now + lead.ai_stage.delay_after();
                // The message is out: a bookkeeping failure must not put the
                // lead back on the retry path. `next_ai_send_at` stays cleared.
                if let Err(e) =
                    self.storage.record_send_success(&lead.id, lead.ai_stage.next(), next_at).await
                {
                    tracing::error!(
                        lead_id = %lead.id,
                        stage = %lead.ai_stage,
                        error = %e,
                        "Message sent but sequence not advanced, lead left unscheduled"
                    );
                    return Ok(LeadOutcome::Sent);
                }
                tracing::info!(
                    lead_id = %lead.id,
                    stage = %lead.ai_stage,
                    next_stage = %lead.ai_stage.next(),
                    %next_at,
                    "Outreach message sent"
                );
                Ok(LeadOutcome::Sent)
            },
            GeneratedMessage::Empty => {
                self.storage.pause_sequence(&lead.id, PauseReason::NoMessageGenerated).await?;
                tracing::warn!(lead_id = %lead.id, "No message generated, sequence paused");
                Ok(LeadOutcome::Paused)
            },
            GeneratedMessage::Error(reason) => Err(ServiceError::Generation(reason)),
        }
    }

    /// Send the takeover message to leads whose owed human reply is overdue.
    pub async fn process_ai_takeover_messages(
        &self,
        now: DateTime<Utc>,
    ) -> Result<TickReport, ServiceError> {
        let Some(_tick) = self.in_flight.try_begin_tick() else {
            return Ok(TickReport::skipped());
        };

        let leads = self.storage.find_takeover_due(now, self.config.batch_size).await?;
        let mut report = TickReport { selected: leads.len(), ..TickReport::default() };

        for lead in &leads {
            let Some(_lead_guard) = self.in_flight.try_claim_lead(&lead.id) else {
                report.contended += 1;
                continue;
            };
            let Some(deadline) = lead.human_response_deadline else {
                continue;
            };
            match self.storage.claim_takeover(&lead.id, deadline).await {
                Ok(true) => {},
                Ok(false) => {
                    report.contended += 1;
                    continue;
                },
                Err(e) => {
                    tracing::error!(lead_id = %lead.id, error = %e, "Failed to claim takeover");
                    continue;
                },
            }

            let body = takeover_message(lead);
            match self.messaging.send_message(&lead.id, &body, SenderProfile::AiAssistant, true).await
            {
                Ok(_) => {
                    report.sent += 1;
                    let next_at = now + lead.ai_stage.delay_after();
                    match self.storage.complete_takeover(&lead.id, next_at).await {
                        Ok(()) => tracing::info!(lead_id = %lead.id, "AI takeover message sent"),
                        Err(e) => tracing::error!(
                            lead_id = %lead.id,
                            error = %e,
                            "Takeover sent but not recorded, deadline left cleared"
                        ),
                    }
                },
                Err(e) => {
                    let retry_at = now + self.config.retry_delay;
                    tracing::warn!(lead_id = %lead.id, error = %e, %retry_at, "AI takeover failed, rescheduling");
                    match self.storage.reschedule_takeover(&lead.id, retry_at).await {
                        Ok(()) => report.rescheduled += 1,
                        Err(e) => {
                            tracing::error!(lead_id = %lead.id, error = %e, "Failed to reschedule takeover");
                        },
                    }
                },
            }
        }

        if report.selected > 0 {
            tracing::info!(
                selected = report.selected,
                sent = report.sent,
                rescheduled = report.rescheduled,
                "Takeover pass complete"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_guard_is_exclusive_and_released_on_drop() {
        let in_flight = InFlight::new();
        let guard = in_flight.try_begin_tick();
        assert!(guard.is_some());
        assert!(in_flight.is_ticking());
        assert!(in_flight.try_begin_tick().is_none());
        drop(guard);
        assert!(!in_flight.is_ticking());
        assert!(in_flight.try_begin_tick().is_some());
    }

    #[test]
    fn lead_guard_tracks_membership() {
        let in_flight = InFlight::new();
        let first = in_flight.try_claim_lead("lead-1");
        assert!(first.is_some());
        assert!(in_flight.try_claim_lead("lead-1").is_none());
        assert!(in_flight.try_claim_lead("lead-2").is_some());
        assert_eq!(in_flight.leads_in_flight(), 1);
        drop(first);
        assert_eq!(in_flight.leads_in_flight(), 0);
    }

    #[test]
    fn merge_adds_counts_and_keeps_skip_only_when_both_skipped() {
        let mut report = TickReport { selected: 2, sent: 1, paused: 1, ..TickReport::default() };
        report.merge(TickReport { selected: 1, rescheduled: 1, ..TickReport::default() });
        assert_eq!(report.selected, 3);
        assert_eq!(report.rescheduled, 1);
        assert!(!report.skipped);

        let mut both = TickReport::skipped();
        both.merge(TickReport::skipped());
        assert!(both.skipped);
    }

    #[test]
    fn takeover_message_is_personalized() {
        let lead = Lead {
            id: "l".to_owned(),
            first_name: Some("Sam".to_owned()),
            last_name: None,
            vehicle_interest: None,
            ai_opt_in: true,
            ai_sequence_paused: false,
            ai_pause_reason: None,
            pending_human_response: true,
            human_response_deadline: None,
            next_ai_send_at: None,
            ai_stage: outreach_core::AiStage::Initial,
            ai_messages_sent: 0,
            created_at: Utc::now(),
        };
        assert!(takeover_message(&lead).starts_with("Hi Sam, "));
        let anonymous = Lead { first_name: None, ..lead };
        assert!(takeover_message(&anonymous).starts_with("Hi there, "));
    }
}
