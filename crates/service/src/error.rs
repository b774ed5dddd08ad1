//! Typed error enum for the service layer.
//!
//! Unifies storage, LLM, and SMS failures into a single error type,
//! enabling callers to match on specific failure modes.

use outreach_llm::LlmError;
use outreach_sms::SmsError;
use outreach_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage, LLM, and SMS failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (DB, not found, duplicate, etc.).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// LLM API call failed.
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    /// SMS provider call failed.
    #[error("sms: {0}")]
    Sms(#[from] SmsError),

    /// Caller provided invalid input (empty body, malformed number).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// The lead has no primary phone number to deliver to.
    #[error("lead {0} has no primary phone number")]
    NoPhoneNumber(String),

    /// The message generator reported a failure.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Llm(e) => e.is_transient(),
            Self::Sms(e) => e.is_transient(),
            Self::Generation(_) => true,
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Storage(StorageError::NotFound { .. }))
    }

    /// Whether this error represents a duplicate/conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_duplicate())
    }

    pub(crate) fn lead_not_found(id: &str) -> Self {
        Self::NotFound { entity: "lead", id: id.to_owned() }
    }
}
