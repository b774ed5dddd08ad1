use thiserror::Error;

/// Errors raised while parsing or validating domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    pub(crate) fn invalid(kind: &'static str, value: &str) -> Self {
        Self::InvalidValue { kind, value: value.to_owned() }
    }
}
