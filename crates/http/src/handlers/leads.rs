use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Duration;
use outreach_core::{Lead, LeadPhone, NewLead, OutboundMessage};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::{AddPhoneRequest, HumanResponseRequest, LimitQuery, OptInRequest};
use crate::response_types::HumanResponseResponse;

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewLead>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = state.lead_service.create_lead(input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.lead_service.get_lead(&id).await?))
}

pub async fn add_phone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddPhoneRequest>,
) -> Result<(StatusCode, Json<LeadPhone>), ApiError> {
    let number = state.lead_service.add_phone(&id, &req.number, req.primary).await?;
    Ok((StatusCode::CREATED, Json(LeadPhone { lead_id: id, number, is_primary: req.primary })))
}

pub async fn resume_sequence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.lead_service.resume_sequence(&id).await?))
}

pub async fn pause_sequence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.lead_service.pause_sequence(&id).await?))
}

pub async fn set_opt_in(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<OptInRequest>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.lead_service.set_opt_in(&id, req.opt_in).await?))
}

pub async fn request_human_response(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<HumanResponseRequest>,
) -> Result<Json<HumanResponseResponse>, ApiError> {
    let within = Duration::try_minutes(req.within_minutes)
        .ok_or_else(|| ApiError::BadRequest("within_minutes is out of range".to_owned()))?;
    let deadline = state.lead_service.request_human_response(&id, within).await?;
    Ok(Json(HumanResponseResponse { lead_id: id, deadline }))
}

pub async fn lead_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<OutboundMessage>>, ApiError> {
    state.lead_service.get_lead(&id).await?;
    Ok(Json(state.lead_service.lead_messages(&id, query.capped_limit()).await?))
}
