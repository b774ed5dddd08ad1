//! Background loops driving the scheduler and the maintenance sweep.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::AppState;

/// Spawns the scheduler loop: one tick per configured interval, first tick
/// immediately. Ticks are skipped while processing is switched off.
pub fn start_scheduler_loop(state: Arc<AppState>) {
    let every = state.scheduler.config().tick_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = every.as_secs(), "Scheduler loop started");
        loop {
            interval.tick().await;
            if !state.processing_active.load(Ordering::SeqCst) {
                continue;
            }
            match state.scheduler.tick(Utc::now()).await {
                Ok(report) if report.skipped => {
                    tracing::debug!("Scheduler loop: previous tick still running");
                },
                Ok(report) => {
                    if report.selected > 0 {
                        tracing::info!(
                            selected = report.selected,
                            sent = report.sent,
                            paused = report.paused,
                            rescheduled = report.rescheduled,
                            "Scheduler loop: tick complete"
                        );
                    }
                },
                Err(e) => {
                    tracing::error!(error = %e, "Scheduler loop: tick failed");
                },
            }
        }
    });
}

/// Spawns a periodic maintenance sweep, first run after one full period.
pub fn start_maintenance_loop(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = every.as_secs(), "Maintenance loop started");
        loop {
            interval.tick().await;
            match state.maintenance.run_maintenance(Utc::now()).await {
                Ok(report) => {
                    tracing::debug!(
                        score = report.health_after.score,
                        cleaned = report.messages_cleaned,
                        retried = report.messages_retried,
                        "Maintenance loop: sweep complete"
                    );
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Maintenance loop: sweep failed");
                },
            }
        }
    });
}
