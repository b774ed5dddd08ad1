use std::sync::Arc;

use axum::extract::State;
use axum::{Form, Json};
use outreach_core::SmsStatus;
use outreach_sms::DeliveryStatus;

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::DeliveryReport;
use crate::response_types::WebhookResponse;

/// Provider delivery callback. Intermediate statuses are acknowledged without
/// touching the record.
pub async fn sms_status(
    State(state): State<Arc<AppState>>,
    Form(report): Form<DeliveryReport>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let status = DeliveryStatus::from_provider(&report.message_status);
    let Some(sms_status @ (SmsStatus::Sent | SmsStatus::Failed)) = status.sms_status() else {
        tracing::debug!(
            provider_message_id = %report.message_sid,
            status = %report.message_status,
            "Ignoring non-terminal delivery status"
        );
        return Ok(Json(WebhookResponse { matched: false }));
    };
    let error = report.error_text();
    let matched = state
        .messaging
        .apply_delivery_status(&report.message_sid, sms_status, error.as_deref())
        .await?;
    Ok(Json(WebhookResponse { matched }))
}
