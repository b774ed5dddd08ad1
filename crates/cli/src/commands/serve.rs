use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::Result;
use outreach_core::{MaintenanceConfig, SchedulerConfig, env_parse_with_default};
use outreach_http::{AppState, create_router, start_maintenance_loop, start_scheduler_loop};
use outreach_service::{InFlight, LeadService, MaintenanceSweep, MessagingService, Scheduler};

use crate::{build_llm, build_sms, open_storage};

pub(crate) async fn run(port: u16, host: String) -> Result<()> {
    let storage = open_storage().await?;
    let llm = Arc::new(build_llm()?);
    let sms = Arc::new(build_sms()?);
    tracing::info!(model = llm.model(), from = sms.from_number(), "Collaborators configured");

    let messaging = Arc::new(MessagingService::new(storage.clone(), sms.clone()));
    let in_flight = Arc::new(InFlight::new());
    let scheduler = Arc::new(Scheduler::new(
        storage.clone(),
        llm,
        messaging.clone(),
        SchedulerConfig::from_env(),
        in_flight.clone(),
    ));
    let maintenance =
        Arc::new(MaintenanceSweep::new(storage.clone(), sms, MaintenanceConfig::from_env()));

    let state = Arc::new(AppState {
        processing_active: AtomicBool::new(true),
        in_flight,
        scheduler,
        maintenance,
        messaging,
        lead_service: Arc::new(LeadService::new(storage.clone())),
        storage_kind: storage.kind(),
    });

    start_scheduler_loop(state.clone());
    let maintenance_secs: u64 = env_parse_with_default("OUTREACH_MAINTENANCE_SECS", 0);
    if maintenance_secs > 0 {
        start_maintenance_loop(state.clone(), Duration::from_secs(maintenance_secs));
    } else {
        tracing::info!("OUTREACH_MAINTENANCE_SECS not set, in-process maintenance disabled");
    }

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
