//! Service layer for outreach
//!
//! The scheduler loop, the pipeline maintenance sweep, the send pipeline and
//! lead operations, wired to storage and to the generator/channel seams.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]

mod collaborators;
mod error;
mod lead_service;
mod maintenance;
mod messaging;
mod scheduler;

#[cfg(test)]
mod tests;

pub use collaborators::{MessageGenerator, OutboundChannel, OutboundRequest};
pub use error::ServiceError;
pub use lead_service::LeadService;
pub use maintenance::{MaintenanceReport, MaintenanceSweep};
pub use messaging::MessagingService;
pub use scheduler::{InFlight, LeadGuard, Scheduler, TickGuard, TickReport};
