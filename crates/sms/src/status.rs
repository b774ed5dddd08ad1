use outreach_core::SmsStatus;

/// Message status as reported by the SMS provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Queued,
    Accepted,
    Sending,
    Sent,
    Delivered,
    Failed,
    Undelivered,
    Unknown(String),
}

impl DeliveryStatus {
    /// Parse a provider status string (case-insensitive).
    #[must_use]
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "accepted" => Self::Accepted,
            "sending" => Self::Sending,
            "sent" => Self::Sent,
            "delivered" => Self::Delivered,
            "failed" => Self::Failed,
            "undelivered" => Self::Undelivered,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// The stored status this provider status maps to.
    ///
    /// `None` for statuses this pipeline does not track.
    #[must_use]
    pub fn sms_status(&self) -> Option<SmsStatus> {
        match *self {
            Self::Queued | Self::Accepted | Self::Sending => Some(SmsStatus::Pending),
            Self::Sent | Self::Delivered => Some(SmsStatus::Sent),
            Self::Failed | Self::Undelivered => Some(SmsStatus::Failed),
            Self::Unknown(_) => None,
        }
    }
}
