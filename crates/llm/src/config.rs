use std::time::Duration;

/// Default chat model for outreach messages.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible API base.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Waits between attempts after a transient failure. One attempt more than
/// there are entries is made before giving up.
pub const DEFAULT_RETRY_BACKOFF: [Duration; 3] =
    [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];

/// Credentials and tuning for the message generator.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
    pub retry_backoff: Vec<Duration>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

impl LlmConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(60),
            retry_backoff: DEFAULT_RETRY_BACKOFF.to_vec(),
        }
    }

    /// Read `OUTREACH_LLM_*` variables and `OUTREACH_MODEL`. Returns `None`
    /// when the API key is missing.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let mut config = Self::new(
            var("OUTREACH_LLM_API_KEY")?,
            var("OUTREACH_LLM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
        );
        if let Some(model) = var("OUTREACH_MODEL") {
            config.model = model;
        }
        Some(config)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = LlmConfig::new("sk-secret", DEFAULT_API_URL);
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains(DEFAULT_MODEL));
    }

    #[test]
    fn builders_override_defaults() {
        let config = LlmConfig::new("k", "http://localhost")
            .with_model("small")
            .with_retry_backoff(Vec::new());
        assert_eq!(config.model, "small");
        assert!(config.retry_backoff.is_empty());
    }
}
