use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Prefix appended to `sms_error` once a failed message has been retried.
///
/// Records carrying it are excluded from later retry scans.
pub const RETRIED_MARKER: &str = "Retried:";

/// Whether an `sms_error` value already records a retry attempt.
#[must_use]
pub fn is_retried_error(error: Option<&str>) -> bool {
    error.is_some_and(|e| e.contains(RETRIED_MARKER))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    In,
    Out,
}

impl MessageDirection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl FromStr for MessageDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            _ => Err(DomainError::invalid("message direction", s)),
        }
    }
}

/// Delivery status of an outbound SMS.
///
/// `Pending` transitions to `Sent` or `Failed` once; a successful retry moves
/// `Failed` back to `Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsStatus {
    Pending,
    Sent,
    Failed,
}

impl SmsStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmsStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::invalid("sms status", s)),
        }
    }
}

/// Who an outbound message is sent as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderProfile {
    #[default]
    AiAssistant,
    Human,
    System,
}

impl SenderProfile {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::AiAssistant => "ai_assistant",
            Self::Human => "human",
            Self::System => "system",
        }
    }
}

/// One attempted send, as recorded in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: i64,
    pub lead_id: String,
    pub direction: MessageDirection,
    pub body: String,
    pub sms_status: SmsStatus,
    pub sent_at: DateTime<Utc>,
    pub sms_error: Option<String>,
    pub provider_message_id: Option<String>,
    pub is_automated: bool,
}

impl OutboundMessage {
    /// Whether this record may still be picked up by a retry scan.
    #[must_use]
    pub fn is_retry_candidate(&self) -> bool {
        self.sms_status == SmsStatus::Failed && !is_retried_error(self.sms_error.as_deref())
    }
}
