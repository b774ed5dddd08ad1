use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use outreach_core::{MaintenanceConfig, SchedulerConfig};
use outreach_service::{InFlight, MaintenanceSweep, MessagingService, Scheduler};
use outreach_storage::MessageStore;

use crate::{build_llm, build_sms, open_storage};

pub(crate) async fn run_tick() -> Result<()> {
    let storage = open_storage().await?;
    let messaging = Arc::new(MessagingService::new(storage.clone(), Arc::new(build_sms()?)));
    let scheduler = Scheduler::new(
        storage,
        Arc::new(build_llm()?),
        messaging,
        SchedulerConfig::from_env(),
        Arc::new(InFlight::new()),
    );
    let report = scheduler.tick(Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn run_maintain() -> Result<()> {
    let storage = open_storage().await?;
    let sweep = MaintenanceSweep::new(storage, Arc::new(build_sms()?), MaintenanceConfig::from_env());
    let report = sweep.run_maintenance(Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Reads counts directly so no provider credentials are needed.
pub(crate) async fn run_health() -> Result<()> {
    let storage = open_storage().await?;
    let window = MaintenanceConfig::from_env().health_window;
    let health = storage.message_status_counts(Utc::now() - window).await?.health();
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}
