use chrono::Duration;
use outreach_core::{NewLead, SenderProfile, SmsStatus};
use outreach_storage::traits::MessageStore;

use super::{FakeChannel, Harness};
use crate::ServiceError;

#[tokio::test]
async fn test_send_records_pending_with_provider_id() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;

    let record = harness
        .messaging
        .send_message("lead-a", "  See you Saturday!  ", SenderProfile::Human, false)
        .await
        .unwrap();

    assert_eq!(record.body, "See you Saturday!");
    assert_eq!(record.sms_status, SmsStatus::Pending);
    assert_eq!(record.provider_message_id.as_deref(), Some("SM0000"));
    assert!(!record.is_automated);

    let stored = harness.storage.get_message(record.id).await.unwrap().unwrap();
    assert_eq!(stored.provider_message_id.as_deref(), Some("SM0000"));
    assert_eq!(harness.channel.requests()[0].sender, SenderProfile::Human);
}

#[tokio::test]
async fn test_empty_body_is_rejected_before_any_record() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;

    let err = harness
        .messaging
        .send_message("lead-a", "   ", SenderProfile::AiAssistant, true)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(harness.storage.get_lead_messages("lead-a", 10).await.unwrap().is_empty());
    assert_eq!(harness.channel.sent_count(), 0);
}

#[tokio::test]
async fn test_missing_phone_is_an_error() {
    let harness = Harness::new();
    harness.insert(NewLead { id: Some("bare".to_owned()), ..NewLead::default() }).await;

    let err = harness
        .messaging
        .send_message("bare", "hello", SenderProfile::AiAssistant, true)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NoPhoneNumber(ref id) if id == "bare"));
    assert!(harness.storage.get_lead_messages("bare", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_channel_failure_marks_record_failed() {
    let harness = Harness::with_channel(FakeChannel::failing(429, "rate limited"));
    harness.due_lead("lead-a", Duration::minutes(1)).await;

    let err = harness
        .messaging
        .send_message("lead-a", "hello", SenderProfile::AiAssistant, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Sms(_)));
    assert!(err.is_transient());

    let messages = harness.storage.get_lead_messages("lead-a", 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sms_status, SmsStatus::Failed);
    assert!(messages[0].sms_error.as_deref().unwrap().contains("rate limited"));
}

#[tokio::test]
async fn test_delivery_status_updates_matching_record() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let record = harness
        .messaging
        .send_message("lead-a", "hello", SenderProfile::AiAssistant, true)
        .await
        .unwrap();

    let matched =
        harness.messaging.apply_delivery_status("SM0000", SmsStatus::Sent, None).await.unwrap();
    assert!(matched);
    let stored = harness.storage.get_message(record.id).await.unwrap().unwrap();
    assert_eq!(stored.sms_status, SmsStatus::Sent);

    let unknown =
        harness.messaging.apply_delivery_status("SM9999", SmsStatus::Failed, Some("x")).await.unwrap();
    assert!(!unknown);
}

#[tokio::test]
async fn test_late_failure_report_does_not_reopen_sent_record() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    let record = harness
        .messaging
        .send_message("lead-a", "hello", SenderProfile::AiAssistant, true)
        .await
        .unwrap();
    assert!(harness.messaging.apply_delivery_status("SM0000", SmsStatus::Sent, None).await.unwrap());

    let applied = harness
        .messaging
        .apply_delivery_status("SM0000", SmsStatus::Failed, Some("30003 unreachable"))
        .await
        .unwrap();
    assert!(!applied);

    let stored = harness.storage.get_message(record.id).await.unwrap().unwrap();
    assert_eq!(stored.sms_status, SmsStatus::Sent);
    assert!(stored.sms_error.is_none());
}

#[tokio::test]
async fn test_accepted_send_succeeds_when_provider_id_cannot_be_stored() {
    let harness = Harness::new();
    harness.due_lead("lead-a", Duration::minutes(1)).await;
    harness.reject_updates_of("conversations", "provider_message_id");

    let record = harness
        .messaging
        .send_message("lead-a", "hello", SenderProfile::AiAssistant, true)
        .await
        .unwrap();
    assert_eq!(record.provider_message_id.as_deref(), Some("SM0000"));

    let stored = harness.storage.get_message(record.id).await.unwrap().unwrap();
    assert_eq!(stored.sms_status, SmsStatus::Pending);
    assert!(stored.provider_message_id.is_none());
    assert_eq!(harness.channel.sent_count(), 1);
}
