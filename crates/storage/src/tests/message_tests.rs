use chrono::Duration;
use outreach_core::{OutboundMessage, SmsStatus, is_retried_error};

use super::{base_time, create_test_storage, new_lead};
use crate::Storage;

fn seed_message(storage: &Storage, lead_id: &str, age: Duration) -> OutboundMessage {
    storage.insert_outbound(lead_id, "Hi there", true, base_time() - age).unwrap()
}

#[test]
fn test_insert_outbound_is_pending() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();

    let msg = seed_message(&storage, "lead-1", Duration::zero());
    assert_eq!(msg.sms_status, SmsStatus::Pending);
    assert!(msg.is_automated);
    assert_eq!(msg.sent_at, base_time());

    storage.mark_dispatched(msg.id, "SM123").unwrap();
    let fetched = storage.get_message(msg.id).unwrap().unwrap();
    assert_eq!(fetched.sms_status, SmsStatus::Pending);
    assert_eq!(fetched.provider_message_id.as_deref(), Some("SM123"));
}

#[test]
fn test_delivery_report_updates_by_provider_id() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();
    let failing = seed_message(&storage, "lead-1", Duration::zero());
    storage.mark_dispatched(failing.id, "SM-abc").unwrap();
    let delivered = seed_message(&storage, "lead-1", Duration::zero());
    storage.mark_dispatched(delivered.id, "SM-def").unwrap();

    assert!(storage.update_status_by_provider_id("SM-abc", SmsStatus::Failed, Some("30003")).unwrap());
    let failed = storage.get_message(failing.id).unwrap().unwrap();
    assert_eq!(failed.sms_status, SmsStatus::Failed);
    assert_eq!(failed.sms_error.as_deref(), Some("30003"));

    assert!(storage.update_status_by_provider_id("SM-def", SmsStatus::Sent, None).unwrap());
    let sent = storage.get_message(delivered.id).unwrap().unwrap();
    assert_eq!(sent.sms_status, SmsStatus::Sent);
    assert!(sent.sms_error.is_none());

    assert!(!storage.update_status_by_provider_id("SM-unknown", SmsStatus::Sent, None).unwrap());
}

#[test]
fn test_delivery_report_leaves_final_records_alone() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();
    let delivered = seed_message(&storage, "lead-1", Duration::zero());
    storage.mark_dispatched(delivered.id, "SM-abc").unwrap();
    assert!(storage.update_status_by_provider_id("SM-abc", SmsStatus::Sent, None).unwrap());

    assert!(!storage.update_status_by_provider_id("SM-abc", SmsStatus::Failed, Some("30005")).unwrap());
    let still_sent = storage.get_message(delivered.id).unwrap().unwrap();
    assert_eq!(still_sent.sms_status, SmsStatus::Sent);
    assert!(still_sent.sms_error.is_none());

    let timed_out = seed_message(&storage, "lead-1", Duration::minutes(45));
    storage.mark_dispatched(timed_out.id, "SM-late").unwrap();
    storage.fail_stale_pending(base_time() - Duration::minutes(30), "timed out").unwrap();
    assert!(!storage.update_status_by_provider_id("SM-late", SmsStatus::Sent, None).unwrap());
    let still_failed = storage.get_message(timed_out.id).unwrap().unwrap();
    assert_eq!(still_failed.sms_status, SmsStatus::Failed);
    assert_eq!(still_failed.sms_error.as_deref(), Some("timed out"));
}

#[test]
fn test_fail_stale_pending_only_touches_old_records() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();
    let stale = seed_message(&storage, "lead-1", Duration::minutes(45));
    let fresh = seed_message(&storage, "lead-1", Duration::minutes(5));
    let delivered = seed_message(&storage, "lead-1", Duration::minutes(50));
    storage.mark_retry_succeeded(delivered.id, None).unwrap();

    let cutoff = base_time() - Duration::minutes(30);
    let cleaned = storage.fail_stale_pending(cutoff, "timed out").unwrap();
    assert_eq!(cleaned, 1);

    let stale = storage.get_message(stale.id).unwrap().unwrap();
    assert_eq!(stale.sms_status, SmsStatus::Failed);
    assert_eq!(stale.sms_error.as_deref(), Some("timed out"));
    assert_eq!(storage.get_message(fresh.id).unwrap().unwrap().sms_status, SmsStatus::Pending);
    assert_eq!(storage.get_message(delivered.id).unwrap().unwrap().sms_status, SmsStatus::Sent);
}

#[test]
fn test_retry_candidates_exclude_marked_and_old() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();

    let recent = seed_message(&storage, "lead-1", Duration::minutes(10));
    storage.mark_message_failed(recent.id, "carrier rejected").unwrap();
    let newer = seed_message(&storage, "lead-1", Duration::minutes(2));
    storage.mark_message_failed(newer.id, "unreachable").unwrap();
    let old = seed_message(&storage, "lead-1", Duration::minutes(120));
    storage.mark_message_failed(old.id, "ancient").unwrap();
    let marked = seed_message(&storage, "lead-1", Duration::minutes(5));
    storage.mark_message_failed(marked.id, "x").unwrap();
    storage.mark_retry_failed(marked.id, "y").unwrap();

    let since = base_time() - Duration::minutes(60);
    let candidates = storage.find_retry_candidates(since, 10).unwrap();
    let ids: Vec<_> = candidates.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![newer.id, recent.id]);

    let limited = storage.find_retry_candidates(since, 1).unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_mark_retry_failed_appends_marker() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();
    let msg = seed_message(&storage, "lead-1", Duration::zero());
    storage.mark_message_failed(msg.id, "carrier rejected").unwrap();

    storage.mark_retry_failed(msg.id, "still unreachable").unwrap();
    let after = storage.get_message(msg.id).unwrap().unwrap();
    assert_eq!(after.sms_status, SmsStatus::Failed);
    assert_eq!(after.sms_error.as_deref(), Some("carrier rejected | Retried: still unreachable"));
    assert!(is_retried_error(after.sms_error.as_deref()));
    assert!(!after.is_retry_candidate());
}

#[test]
fn test_mark_retry_succeeded_clears_error() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();
    let msg = seed_message(&storage, "lead-1", Duration::zero());
    storage.mark_message_failed(msg.id, "boom").unwrap();

    storage.mark_retry_succeeded(msg.id, Some("SM-retry")).unwrap();
    let after = storage.get_message(msg.id).unwrap().unwrap();
    assert_eq!(after.sms_status, SmsStatus::Sent);
    assert!(after.sms_error.is_none());
    assert_eq!(after.provider_message_id.as_deref(), Some("SM-retry"));

    assert!(storage.mark_retry_succeeded(9999, None).is_err());
}

#[test]
fn test_status_counts_respect_window() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();

    let sent = seed_message(&storage, "lead-1", Duration::hours(1));
    storage.mark_retry_succeeded(sent.id, None).unwrap();
    let failed = seed_message(&storage, "lead-1", Duration::hours(2));
    storage.mark_message_failed(failed.id, "x").unwrap();
    seed_message(&storage, "lead-1", Duration::minutes(1));
    let outside = seed_message(&storage, "lead-1", Duration::hours(30));
    storage.mark_message_failed(outside.id, "old").unwrap();

    let counts = storage.message_status_counts(base_time() - Duration::hours(24)).unwrap();
    assert_eq!((counts.sent, counts.failed, counts.pending), (1, 1, 1));

    let health = counts.health();
    assert_eq!(health.total, 3);
    assert!(health.score < 100);
}

#[test]
fn test_lead_messages_newest_first() {
    let (storage, _temp_dir) = create_test_storage();
    storage.insert_lead(&new_lead("lead-1", None), base_time()).unwrap();
    let first = seed_message(&storage, "lead-1", Duration::minutes(10));
    let second = seed_message(&storage, "lead-1", Duration::minutes(1));

    let messages = storage.get_lead_messages("lead-1", 10).unwrap();
    let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(storage.get_lead_messages("lead-2", 10).unwrap().is_empty());
}
