use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::wire::{CompletionBody, CompletionRequest};

/// OpenAI-compatible chat-completion client used to write outreach SMS.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    pub(crate) config: LlmConfig,
}

impl LlmClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(mut config: LlmConfig) -> Result<Self, LlmError> {
        config.api_url = config.api_url.trim_end_matches('/').to_owned();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ClientInit(e.to_string()))?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Post `request`, retrying transient failures on the configured backoff.
    ///
    /// # Errors
    /// Returns the first non-transient error, or `RetriesExhausted` wrapping
    /// the last transient one.
    pub(crate) async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let mut backoff = self.config.retry_backoff.iter();
        let mut attempt = 1usize;
        loop {
            let err = match self.post_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };
            let Some(&wait) = backoff.next() else {
                return Err(LlmError::RetriesExhausted(Box::new(err)));
            };
            tracing::warn!(attempt, error = %err, retry_in = ?wait, "Transient LLM failure, retrying");
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    async fn post_once(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::HttpStatus {
                code: status.as_u16(),
                body: truncate(&body, 500).to_owned(),
            });
        }
        let parsed: CompletionBody =
            serde_json::from_str(&body).map_err(|source| LlmError::JsonParse {
                context: format!("completion body: {}", truncate(&body, 200)),
                source,
            })?;
        parsed.into_text()
    }
}

/// Truncates to at most `max_len` bytes at a char boundary.
pub(crate) fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.get(..end).unwrap_or("")
}
