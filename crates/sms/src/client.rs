use serde::Deserialize;

use crate::error::SmsError;
use crate::phone::normalize_e164;
use crate::status::DeliveryStatus;

/// Default API base for a Twilio-compatible provider.
pub const DEFAULT_API_URL: &str = "https://api.twilio.com";

/// Credentials and sender number for the SMS provider.
#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_url: String,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &self.from_number)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SmsConfig {
    /// Read `OUTREACH_SMS_*` variables. Returns `None` when the account sid,
    /// auth token or sender number is missing.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            account_sid: var("OUTREACH_SMS_ACCOUNT_SID")?,
            auth_token: var("OUTREACH_SMS_AUTH_TOKEN")?,
            from_number: var("OUTREACH_SMS_FROM")?,
            api_url: var("OUTREACH_SMS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
        })
    }
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    pub provider_message_id: String,
    pub status: DeliveryStatus,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for a Twilio-compatible messages endpoint.
#[derive(Debug, Clone)]
pub struct SmsClient {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built, or the configured
    /// sender is not a valid phone number.
    pub fn new(mut config: SmsConfig) -> Result<Self, SmsError> {
        config.api_url = config.api_url.trim_end_matches('/').to_owned();
        config.from_number = normalize_e164(&config.from_number)?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SmsError::ClientInit(e.to_string()))?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn from_number(&self) -> &str {
        &self.config.from_number
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.config.api_url, self.config.account_sid)
    }

    /// Submit one SMS.
    ///
    /// # Errors
    /// Returns `InvalidNumber` before any request when `to` cannot be
    /// normalized, `Api` when the provider rejects the message, or
    /// `HttpRequest` on transport failure.
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let to = normalize_e164(to)?;
        let form = [("To", to.as_str()), ("From", self.config.from_number.as_str()), ("Body", body)];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let parsed: Option<ApiErrorBody> = serde_json::from_str(&text).ok();
            let (code, message) = match parsed {
                Some(body) => (body.code, body.message.unwrap_or_else(|| text.clone())),
                None => (None, text),
            };
            tracing::warn!(status = status.as_u16(), ?code, "SMS provider rejected message");
            return Err(SmsError::Api { status: status.as_u16(), code, message });
        }

        let resource: MessageResource =
            serde_json::from_str(&text).map_err(|e| SmsError::JsonParse {
                context: "message resource".to_owned(),
                source: e,
            })?;
        let status = DeliveryStatus::from_provider(resource.status.as_deref().unwrap_or("queued"));
        tracing::debug!(provider_message_id = %resource.sid, ?status, "SMS accepted by provider");
        Ok(SmsReceipt { provider_message_id: resource.sid, status })
    }
}
