use outreach_core::{AiStage, GeneratedMessage, Lead, MAX_SMS_BODY_CHARS, strip_markdown_json};

use crate::client::{LlmClient, truncate};
use crate::error::LlmError;
use crate::wire::{CompletionRequest, JsonMode, OutreachReply, Turn};

const SYSTEM_PROMPT: &str = "You write SMS messages for a car dealership's sales assistant. \
Messages are conversational, carry no emojis or links, and never invent prices or inventory. \
Reply with a JSON object of the form {\"message\": \"...\"}; use an empty message when \
nothing appropriate can be sent.";

/// Completion budget; comfortably above one SMS body.
const MAX_COMPLETION_TOKENS: u32 = 300;

const TEMPERATURE: f32 = 0.7;

/// What the generator knows about a lead when writing its next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutreachContext {
    pub first_name: Option<String>,
    pub vehicle_interest: Option<String>,
    pub stage: AiStage,
    pub messages_sent: u32,
}

impl OutreachContext {
    #[must_use]
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            first_name: lead.first_name.clone().filter(|n| !n.trim().is_empty()),
            vehicle_interest: lead.vehicle_interest.clone().filter(|v| !v.trim().is_empty()),
            stage: lead.ai_stage,
            messages_sent: lead.ai_messages_sent,
        }
    }

    fn prompt(&self) -> String {
        let name = self.first_name.as_deref().unwrap_or("unknown");
        let vehicle = self.vehicle_interest.as_deref().unwrap_or("not specified");
        format!(
            "Customer first name: {name}\n\
             Vehicle of interest: {vehicle}\n\
             Sequence stage: {stage}\n\
             Messages already sent: {sent}\n\n\
             Write {hint}, under {max} characters.",
            stage = self.stage.as_str(),
            hint = self.stage.prompt_hint(),
            sent = self.messages_sent,
            max = MAX_SMS_BODY_CHARS,
        )
    }
}

/// Truncates a string to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s.get(..end).unwrap_or(s),
        None => s,
    }
}

impl LlmClient {
    /// Generate the next outreach SMS for a lead.
    ///
    /// Blank or missing output is [`GeneratedMessage::Empty`]; text is
    /// trimmed to [`MAX_SMS_BODY_CHARS`].
    ///
    /// # Errors
    /// Returns `LlmError` if the API call fails or the response is not the
    /// expected JSON object.
    pub async fn generate_outreach_message(
        &self,
        context: &OutreachContext,
    ) -> Result<GeneratedMessage, LlmError> {
        let prompt = context.prompt();
        let request = CompletionRequest {
            model: &self.config.model,
            messages: [
                Turn { role: "system", content: SYSTEM_PROMPT },
                Turn { role: "user", content: &prompt },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
            response_format: JsonMode::OBJECT,
        };

        let response = self.complete(&request).await?;
        let content = strip_markdown_json(&response);
        if content.is_empty() {
            return Ok(GeneratedMessage::Empty);
        }

        let reply: OutreachReply =
            serde_json::from_str(content).map_err(|e| LlmError::JsonParse {
                context: format!("outreach message (content: {})", truncate(content, 300)),
                source: e,
            })?;

        Ok(match GeneratedMessage::from_text(reply.message.as_deref()) {
            GeneratedMessage::Generated(text) => {
                let body = truncate_chars(&text, MAX_SMS_BODY_CHARS);
                if body.len() < text.len() {
                    tracing::debug!(
                        original_chars = text.chars().count(),
                        "Truncated generated message to SMS limit"
                    );
                }
                GeneratedMessage::Generated(body.trim_end().to_owned())
            },
            other => other,
        })
    }

    /// Generate for `lead`, reporting any client failure, retries included,
    /// as [`GeneratedMessage::Error`].
    pub async fn generate_for_lead(&self, lead: &Lead) -> GeneratedMessage {
        match self.generate_outreach_message(&OutreachContext::from_lead(lead)).await {
            Ok(generated) => generated,
            Err(e) => {
                tracing::warn!(lead_id = %lead.id, error = %e, "Message generation failed");
                GeneratedMessage::Error(e.to_string())
            },
        }
    }
}
