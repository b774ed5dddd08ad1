use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use outreach_service::TickReport;

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::SetProcessingRequest;
use crate::response_types::{SchedulerStatusResponse, SetProcessingResponse};

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatusResponse> {
    let config = state.scheduler.config();
    Json(SchedulerStatusResponse {
        processing_active: state.processing_active.load(Ordering::SeqCst),
        tick_in_progress: state.in_flight.is_ticking(),
        leads_in_flight: state.in_flight.leads_in_flight(),
        batch_size: config.batch_size,
        tick_interval_secs: config.tick_interval.as_secs(),
        storage: state.storage_kind.to_owned(),
    })
}

/// Run one tick now. Returns a skipped report if the loop is mid-tick.
pub async fn run_tick(State(state): State<Arc<AppState>>) -> Result<Json<TickReport>, ApiError> {
    Ok(Json(state.scheduler.tick(Utc::now()).await?))
}

pub async fn set_processing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetProcessingRequest>,
) -> Json<SetProcessingResponse> {
    state.processing_active.store(req.active, Ordering::SeqCst);
    tracing::info!(active = req.active, "Scheduler processing toggled");
    Json(SetProcessingResponse { active: req.active })
}
