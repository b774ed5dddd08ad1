//! Typed error enum for the SMS crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("provider rejected message (HTTP {status}): {message}")]
    Api { status: u16, code: Option<i64>, message: String },
    #[error("invalid phone number: {0}")]
    InvalidNumber(String),
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl SmsError {
    /// Whether this error is transient and the send may succeed later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
