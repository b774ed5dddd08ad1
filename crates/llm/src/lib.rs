//! LLM client for outreach message generation
//!
//! OpenAI-compatible chat completion with bounded retry on transient
//! failures, plus the stage-aware outreach prompt.

mod client;
mod config;
mod error;
mod outreach;
mod wire;

#[cfg(test)]
mod retry_tests;

pub use client::LlmClient;
pub use config::{DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_RETRY_BACKOFF, LlmConfig};
pub use error::LlmError;
pub use outreach::{OutreachContext, truncate_chars};
