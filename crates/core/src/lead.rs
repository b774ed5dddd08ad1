use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AiStage, DomainError};

/// A prospective customer and the state of its automated outreach sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub vehicle_interest: Option<String>,
    pub ai_opt_in: bool,
    pub ai_sequence_paused: bool,
    pub ai_pause_reason: Option<PauseReason>,
    pub pending_human_response: bool,
    pub human_response_deadline: Option<DateTime<Utc>>,
    pub next_ai_send_at: Option<DateTime<Utc>>,
    pub ai_stage: AiStage,
    pub ai_messages_sent: u32,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Whether the scheduler loop should send this lead's next message at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.ai_opt_in
            && !self.ai_sequence_paused
            && !self.pending_human_response
            && self.next_ai_send_at.is_some_and(|at| at <= now)
    }

    /// Whether a human reply was owed and its deadline has passed at `now`.
    #[must_use]
    pub fn is_takeover_due(&self, now: DateTime<Utc>) -> bool {
        self.ai_opt_in
            && self.pending_human_response
            && self.human_response_deadline.is_some_and(|at| at <= now)
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_owned(),
            (None, Some(last)) => last.to_owned(),
            (None, None) => self.id.clone(),
        }
    }
}

/// Input for onboarding a lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub vehicle_interest: Option<String>,
    #[serde(default)]
    pub ai_opt_in: bool,
    #[serde(default)]
    pub next_ai_send_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewLead {
    /// Returns the caller-supplied id or a fresh UUID v4.
    #[must_use]
    pub fn id_or_generate(&self) -> String {
        self.id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToOwned::to_owned)
    }
}

/// A phone number attached to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadPhone {
    pub lead_id: String,
    pub number: String,
    pub is_primary: bool,
}

/// Why a lead's automated sequence was paused or flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// The generator produced nothing; requires operator intervention.
    NoMessageGenerated,
    /// A transient failure; the lead stays unpaused and is retried.
    ProcessingError,
    /// Paused by an operator.
    Manual,
    /// The lead opted out of automated messages.
    OptedOut,
}

impl PauseReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::NoMessageGenerated => "no_message_generated",
            Self::ProcessingError => "processing_error",
            Self::Manual => "manual",
            Self::OptedOut => "opted_out",
        }
    }

    /// Parse a stored reason, mapping unknown values to `None` with a warning.
    #[must_use]
    pub fn parse_stored(s: Option<&str>) -> Option<Self> {
        let s = s?;
        match s.parse() {
            Ok(reason) => Some(reason),
            Err(_) => {
                tracing::warn!(invalid_reason = %s, "unknown ai_pause_reason in store, ignoring");
                None
            },
        }
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PauseReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_message_generated" => Ok(Self::NoMessageGenerated),
            "processing_error" => Ok(Self::ProcessingError),
            "manual" => Ok(Self::Manual),
            "opted_out" => Ok(Self::OptedOut),
            _ => Err(DomainError::invalid("pause reason", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn lead(now: DateTime<Utc>) -> Lead {
        Lead {
            id: "lead-1".to_owned(),
            first_name: Some("Ana".to_owned()),
            last_name: None,
            vehicle_interest: None,
            ai_opt_in: true,
            ai_sequence_paused: false,
            ai_pause_reason: None,
            pending_human_response: false,
            human_response_deadline: None,
            next_ai_send_at: Some(now - Duration::minutes(1)),
            ai_stage: AiStage::Initial,
            ai_messages_sent: 0,
            created_at: now,
        }
    }

    #[test]
    fn due_requires_every_gate() {
        let now = Utc::now();
        assert!(lead(now).is_due(now));

        let mut l = lead(now);
        l.ai_opt_in = false;
        assert!(!l.is_due(now));

        let mut l = lead(now);
        l.ai_sequence_paused = true;
        assert!(!l.is_due(now));

        let mut l = lead(now);
        l.pending_human_response = true;
        assert!(!l.is_due(now));

        let mut l = lead(now);
        l.next_ai_send_at = None;
        assert!(!l.is_due(now));

        let mut l = lead(now);
        l.next_ai_send_at = Some(now + Duration::seconds(1));
        assert!(!l.is_due(now));
    }

    #[test]
    fn due_exactly_at_schedule_time() {
        let now = Utc::now();
        let mut l = lead(now);
        l.next_ai_send_at = Some(now);
        assert!(l.is_due(now));
    }

    #[test]
    fn takeover_due_after_deadline() {
        let now = Utc::now();
        let mut l = lead(now);
        l.pending_human_response = true;
        l.human_response_deadline = Some(now - Duration::minutes(2));
        assert!(l.is_takeover_due(now));
        assert!(!l.is_due(now));

        l.human_response_deadline = Some(now + Duration::minutes(2));
        assert!(!l.is_takeover_due(now));
    }

    #[test]
    fn pause_reason_parsing() {
        assert_eq!("processing_error".parse::<PauseReason>().unwrap(), PauseReason::ProcessingError);
        assert!("sleepy".parse::<PauseReason>().is_err());
        assert_eq!(PauseReason::parse_stored(Some("sleepy")), None);
        assert_eq!(PauseReason::parse_stored(None), None);
    }

    #[test]
    fn new_lead_generates_id_when_blank() {
        let input = NewLead { id: Some("  ".to_owned()), ..NewLead::default() };
        assert_eq!(input.id_or_generate().len(), 36);
        let input = NewLead { id: Some("abc".to_owned()), ..NewLead::default() };
        assert_eq!(input.id_or_generate(), "abc");
    }
}
