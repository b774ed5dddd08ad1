//! Outbound SMS channel
//!
//! Client for a Twilio-compatible messages API, E.164 phone normalization,
//! and mapping of provider delivery statuses onto [`SmsStatus`].
//!
//! [`SmsStatus`]: outreach_core::SmsStatus

mod client;
mod error;
mod phone;
mod status;


pub use client::{SmsClient, SmsConfig, SmsReceipt};
pub use error::SmsError;
pub use phone::normalize_e164;
pub use status::DeliveryStatus;
