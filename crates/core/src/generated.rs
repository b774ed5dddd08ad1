use serde::{Deserialize, Serialize};

/// Outcome of asking the message generator for a lead's next message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GeneratedMessage {
    /// Text ready to send.
    Generated(String),
    /// The generator answered but produced nothing usable.
    Empty,
    /// The generator call itself failed.
    Error(String),
}

impl GeneratedMessage {
    /// Classify raw generator output: blank text is `Empty`.
    #[must_use]
    pub fn from_text(text: Option<&str>) -> Self {
        match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Self::Generated(t.to_owned()),
            None => Self::Empty,
        }
    }
}
