//! Chat-completion request and response bodies.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Serialize)]
pub(crate) struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: [Turn<'a>; 2],
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: JsonMode,
}

#[derive(Serialize)]
pub(crate) struct Turn<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub(crate) struct JsonMode {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl JsonMode {
    pub const OBJECT: Self = Self { kind: "json_object" };
}

#[derive(Deserialize)]
pub(crate) struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionBody {
    /// Content of the first choice; `null` content reads as empty.
    pub fn into_text(self) -> Result<String, LlmError> {
        let choice = self.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

/// The JSON object the model is asked to return.
#[derive(Deserialize)]
pub(crate) struct OutreachReply {
    #[serde(default)]
    pub message: Option<String>,
}
