//! HTTP API server for outreach.

#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]

pub mod api_error;
mod handlers;
mod query_types;
mod response_types;
mod runner;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::routing::{get, post};
use axum::{Json, Router};
use outreach_service::{InFlight, LeadService, MaintenanceSweep, MessagingService, Scheduler};
use tower_http::cors::CorsLayer;

pub use response_types::{SchedulerStatusResponse, VersionResponse};
pub use runner::{start_maintenance_loop, start_scheduler_loop};

/// Shared application state for all HTTP handlers and background loops.
pub struct AppState {
    /// Switch for the background scheduler loop
    pub processing_active: AtomicBool,
    /// Tick and per-lead guards, shared with the scheduler
    pub in_flight: Arc<InFlight>,
    pub scheduler: Arc<Scheduler>,
    pub maintenance: Arc<MaintenanceSweep>,
    pub messaging: Arc<MessagingService>,
    pub lead_service: Arc<LeadService>,
    /// Active storage backend name, for status output
    pub storage_kind: &'static str,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/api/scheduler/status", get(handlers::scheduler::get_status))
        .route("/api/scheduler/run", post(handlers::scheduler::run_tick))
        .route("/api/processing", post(handlers::scheduler::set_processing))
        .route("/api/pipeline/health", get(handlers::pipeline::get_health))
        .route("/api/pipeline/maintenance", post(handlers::pipeline::run_maintenance))
        .route("/api/leads", post(handlers::leads::create_lead))
        .route("/api/leads/{id}", get(handlers::leads::get_lead))
        .route("/api/leads/{id}/phones", post(handlers::leads::add_phone))
        .route("/api/leads/{id}/resume", post(handlers::leads::resume_sequence))
        .route("/api/leads/{id}/pause", post(handlers::leads::pause_sequence))
        .route("/api/leads/{id}/opt-in", post(handlers::leads::set_opt_in))
        .route("/api/leads/{id}/human-response", post(handlers::leads::request_human_response))
        .route("/api/leads/{id}/messages", get(handlers::leads::lead_messages))
        .route("/webhooks/sms-status", post(handlers::webhooks::sms_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION").to_owned() })
}
