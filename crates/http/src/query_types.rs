//! Request/query types (Deserialize)

use outreach_core::{DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT};
use serde::Deserialize;

const fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

const fn default_primary() -> bool {
    true
}

const fn default_response_minutes() -> i64 {
    15
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl LimitQuery {
    /// Cap limit to prevent DoS via unbounded queries.
    pub fn capped_limit(&self) -> usize {
        self.limit.min(MAX_QUERY_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct SetProcessingRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddPhoneRequest {
    pub number: String,
    #[serde(default = "default_primary")]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct OptInRequest {
    pub opt_in: bool,
}

#[derive(Debug, Deserialize)]
pub struct HumanResponseRequest {
    #[serde(default = "default_response_minutes")]
    pub within_minutes: i64,
}

/// Delivery callback as posted by a Twilio-compatible provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryReport {
    pub message_sid: String,
    pub message_status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl DeliveryReport {
    /// Error text to record, combining the provider's code and message.
    pub fn error_text(&self) -> Option<String> {
        let message = self.error_message.as_deref().map(str::trim).filter(|m| !m.is_empty());
        let code = self.error_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        match (code, message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (None, Some(message)) => Some(message.to_owned()),
            (Some(code), None) => Some(format!("provider error {code}")),
            (None, None) => None,
        }
    }
}
