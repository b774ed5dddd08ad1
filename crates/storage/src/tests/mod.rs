//! Test utilities and module declarations for storage tests.

use crate::Storage;
use chrono::{DateTime, Duration, TimeZone, Utc};
use outreach_core::NewLead;
use tempfile::TempDir;

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (storage, temp_dir)
}

/// Fixed reference instant so ordering assertions do not depend on the clock.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).single().unwrap_or_default()
}

pub fn new_lead(id: &str, due_in: Option<Duration>) -> NewLead {
    NewLead {
        id: Some(id.to_owned()),
        first_name: Some("Dana".to_owned()),
        last_name: Some("Reyes".to_owned()),
        vehicle_interest: Some("2021 Civic".to_owned()),
        ai_opt_in: true,
        next_ai_send_at: due_in.map(|d| base_time() + d),
        phone: Some("+15551230000".to_owned()),
    }
}

mod message_tests;
