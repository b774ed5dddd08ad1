//! Core types for the outreach scheduler
//!
//! Domain types shared across all other crates: leads, outbound messages,
//! outreach stages, pipeline health, and environment-driven configuration.

mod config;
pub mod constants;
mod env_config;
mod error;
mod generated;
mod health;
mod json_utils;
mod lead;
mod message;
mod stage;

pub use config::{MaintenanceConfig, SchedulerConfig};
pub use constants::*;
pub use env_config::env_parse_with_default;
pub use error::DomainError;
pub use generated::GeneratedMessage;
pub use health::PipelineHealth;
pub use json_utils::strip_markdown_json;
pub use lead::{Lead, LeadPhone, NewLead, PauseReason};
pub use message::{
    MessageDirection, OutboundMessage, RETRIED_MARKER, SenderProfile, SmsStatus,
    is_retried_error,
};
pub use stage::AiStage;
