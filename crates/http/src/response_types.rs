//! Response types (Serialize)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchedulerStatusResponse {
    pub processing_active: bool,
    pub tick_in_progress: bool,
    pub leads_in_flight: usize,
    pub batch_size: usize,
    pub tick_interval_secs: u64,
    pub storage: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetProcessingResponse {
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HumanResponseResponse {
    pub lead_id: String,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub matched: bool,
}
