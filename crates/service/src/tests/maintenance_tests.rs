use chrono::{Duration, Utc};
use outreach_core::{NewLead, SmsStatus, is_retried_error};
use outreach_storage::traits::MessageStore;

use super::{FakeChannel, Harness, PHONE};

#[tokio::test]
async fn test_cleanup_fails_only_stale_pending_messages() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    let stale = harness
        .storage
        .insert_outbound("lead-a", "old hello", true, now - Duration::minutes(45))
        .await
        .unwrap();
    let fresh = harness
        .storage
        .insert_outbound("lead-a", "new hello", true, now - Duration::minutes(10))
        .await
        .unwrap();

    let cleaned = harness.sweep().cleanup_old_pending_messages(now).await.unwrap();
    assert_eq!(cleaned, 1);

    let stale = harness.storage.get_message(stale.id).await.unwrap().unwrap();
    assert_eq!(stale.sms_status, SmsStatus::Failed);
    assert!(stale.sms_error.unwrap().contains("timed out"));

    let fresh = harness.storage.get_message(fresh.id).await.unwrap().unwrap();
    assert_eq!(fresh.sms_status, SmsStatus::Pending);
    assert!(fresh.sms_error.is_none());
}

#[tokio::test]
async fn test_retry_success_marks_sent_and_clears_error() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    let msg = harness
        .storage
        .insert_outbound("lead-a", "hello again", true, now - Duration::minutes(10))
        .await
        .unwrap();
    harness.storage.mark_message_failed(msg.id, "carrier rejected").await.unwrap();

    let succeeded = harness.sweep().retry_failed_messages(now, 10).await.unwrap();
    assert_eq!(succeeded, 1);

    let msg = harness.storage.get_message(msg.id).await.unwrap().unwrap();
    assert_eq!(msg.sms_status, SmsStatus::Sent);
    assert!(msg.sms_error.is_none());
    assert_eq!(msg.provider_message_id.as_deref(), Some("SM0000"));

    let requests = harness.channel.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].to, PHONE);
    assert_eq!(requests[0].body, "hello again");
}

#[tokio::test]
async fn test_failed_retry_is_marked_and_never_retried_again() {
    let harness = Harness::with_channel(FakeChannel::failing(503, "still down"));
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    let msg = harness
        .storage
        .insert_outbound("lead-a", "hello", true, now - Duration::minutes(5))
        .await
        .unwrap();
    harness.storage.mark_message_failed(msg.id, "carrier rejected").await.unwrap();
    let sweep = harness.sweep();

    assert_eq!(sweep.retry_failed_messages(now, 10).await.unwrap(), 0);
    let stored = harness.storage.get_message(msg.id).await.unwrap().unwrap();
    assert_eq!(stored.sms_status, SmsStatus::Failed);
    let error = stored.sms_error.unwrap();
    assert!(error.starts_with("carrier rejected"));
    assert!(is_retried_error(Some(&error)));

    harness.channel.set_failure(None);
    assert_eq!(sweep.retry_failed_messages(now, 10).await.unwrap(), 0);
    assert_eq!(harness.channel.sent_count(), 1, "a retried message is not attempted twice");
}

#[tokio::test]
async fn test_failure_report_after_successful_retry_does_not_trigger_second_retry() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    let msg = harness
        .storage
        .insert_outbound("lead-a", "hello", true, now - Duration::minutes(5))
        .await
        .unwrap();
    harness.storage.mark_message_failed(msg.id, "carrier rejected").await.unwrap();
    let sweep = harness.sweep();

    assert_eq!(sweep.retry_failed_messages(now, 10).await.unwrap(), 1);
    let applied = harness
        .messaging
        .apply_delivery_status("SM0000", SmsStatus::Failed, Some("30003 unreachable"))
        .await
        .unwrap();
    assert!(!applied);

    let stored = harness.storage.get_message(msg.id).await.unwrap().unwrap();
    assert_eq!(stored.sms_status, SmsStatus::Sent);

    assert_eq!(sweep.retry_failed_messages(now, 10).await.unwrap(), 0);
    assert_eq!(harness.channel.sent_count(), 1);
}

#[tokio::test]
async fn test_retry_skips_lead_without_phone() {
    let harness = Harness::new();
    harness
        .insert(NewLead { id: Some("no-phone".to_owned()), ai_opt_in: true, ..NewLead::default() })
        .await;
    let now = Utc::now();
    let msg = harness
        .storage
        .insert_outbound("no-phone", "hello", true, now - Duration::minutes(5))
        .await
        .unwrap();
    harness.storage.mark_message_failed(msg.id, "no route").await.unwrap();

    assert_eq!(harness.sweep().retry_failed_messages(now, 10).await.unwrap(), 0);
    assert_eq!(harness.channel.sent_count(), 0);

    let stored = harness.storage.get_message(msg.id).await.unwrap().unwrap();
    assert_eq!(stored.sms_status, SmsStatus::Failed);
    assert_eq!(stored.sms_error.as_deref(), Some("no route"));
}

#[tokio::test]
async fn test_retry_ignores_failures_outside_lookback() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    let msg = harness
        .storage
        .insert_outbound("lead-a", "hello", true, now - Duration::hours(3))
        .await
        .unwrap();
    harness.storage.mark_message_failed(msg.id, "carrier rejected").await.unwrap();

    assert_eq!(harness.sweep().retry_failed_messages(now, 10).await.unwrap(), 0);
    assert_eq!(harness.channel.sent_count(), 0);
}

#[tokio::test]
async fn test_retry_respects_limit() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    for i in 0..4 {
        let msg = harness
            .storage
            .insert_outbound("lead-a", &format!("hello {i}"), true, now - Duration::minutes(i + 1))
            .await
            .unwrap();
        harness.storage.mark_message_failed(msg.id, "busy").await.unwrap();
    }

    assert_eq!(harness.sweep().retry_failed_messages(now, 2).await.unwrap(), 2);
    assert_eq!(harness.channel.sent_count(), 2);
}

#[tokio::test]
async fn test_health_of_empty_window_is_perfect() {
    let harness = Harness::new();
    let health = harness.sweep().get_health_status(Utc::now()).await.unwrap();
    assert_eq!(health.total, 0);
    assert_eq!(health.score, 100);
}

#[tokio::test]
async fn test_run_maintenance_reports_cleanup_and_retry() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let now = Utc::now();
    harness
        .storage
        .insert_outbound("lead-a", "stuck", true, now - Duration::minutes(45))
        .await
        .unwrap();
    let failed = harness
        .storage
        .insert_outbound("lead-a", "bounced", true, now - Duration::minutes(20))
        .await
        .unwrap();
    harness.storage.mark_message_failed(failed.id, "carrier rejected").await.unwrap();

    let report = harness.sweep().run_maintenance(now).await.unwrap();

    assert_eq!(report.messages_cleaned, 1);
    // The timed-out message is also inside the lookback and gets its one retry.
    assert_eq!(report.messages_retried, 2);
    assert_eq!(report.health_before.total, 2);
    assert_eq!(report.health_before.pending, 1);
    assert_eq!(report.health_before.failed, 1);
    assert_eq!(report.health_after.sent, 2);
    assert_eq!(report.health_after.score, 100);
    assert_eq!(
        report.health_improvement,
        i16::from(report.health_after.score) - i16::from(report.health_before.score)
    );
    assert_eq!(report.timestamp, now);

    let json = serde_json::to_value(&report).unwrap();
    for key in
        ["healthBefore", "healthAfter", "messagesRetried", "messagesCleaned", "healthImprovement", "timestamp"]
    {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json["healthBefore"].get("failureRate").is_some());
}
