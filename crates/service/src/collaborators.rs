//! Seams to the message generator and the outbound channel.
//!
//! The scheduler and maintenance sweep only see these traits; production
//! wiring uses [`LlmClient`] and [`SmsClient`].

use async_trait::async_trait;
use outreach_core::{GeneratedMessage, Lead, SenderProfile};
use outreach_llm::LlmClient;
use outreach_sms::{SmsClient, SmsError, SmsReceipt};

/// Produces the next outreach message for a lead.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, lead: &Lead) -> GeneratedMessage;
}

/// One message handed to the outbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub lead_id: String,
    pub to: String,
    pub body: String,
    pub sender: SenderProfile,
    pub is_automated: bool,
}

/// Delivers a message to a phone number.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<SmsReceipt, SmsError>;
}

#[async_trait]
impl MessageGenerator for LlmClient {
    async fn generate(&self, lead: &Lead) -> GeneratedMessage {
        self.generate_for_lead(lead).await
    }
}

#[async_trait]
impl OutboundChannel for SmsClient {
    async fn send(&self, request: &OutboundRequest) -> Result<SmsReceipt, SmsError> {
        tracing::debug!(
            lead_id = %request.lead_id,
            sender = request.sender.as_str(),
            automated = request.is_automated,
            "Sending SMS"
        );
        self.send_sms(&request.to, &request.body).await
    }
}
