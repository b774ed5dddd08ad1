use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use outreach_core::PipelineHealth;
use outreach_service::MaintenanceReport;

use crate::AppState;
use crate::api_error::ApiError;

pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PipelineHealth>, ApiError> {
    Ok(Json(state.maintenance.get_health_status(Utc::now()).await?))
}

/// One maintenance sweep, for external triggers such as a cron job.
pub async fn run_maintenance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MaintenanceReport>, ApiError> {
    Ok(Json(state.maintenance.run_maintenance(Utc::now()).await?))
}
