use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::LlmClient;
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::wire::{CompletionRequest, JsonMode, Turn};

const ENDPOINT: &str = "/v1/chat/completions";

fn fast_client(server: &MockServer, retries: usize) -> LlmClient {
    let config = LlmConfig::new("test-key", server.uri())
        .with_retry_backoff(vec![Duration::from_millis(5); retries]);
    LlmClient::new(config).unwrap()
}

fn request() -> CompletionRequest<'static> {
    CompletionRequest {
        model: "test-model",
        messages: [Turn { role: "system", content: "rules" }, Turn { role: "user", content: "lead" }],
        temperature: 0.0,
        max_tokens: 16,
        response_format: JsonMode::OBJECT,
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

#[tokio::test]
async fn test_first_attempt_sends_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(completion("done"))
        .expect(1)
        .mount(&server)
        .await;

    let text = fast_client(&server, 3).complete(&request()).await.unwrap();
    assert_eq!(text, "done");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(completion("after backoff"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let text = fast_client(&server, 3).complete(&request()).await.unwrap();
    assert_eq!(text, "after backoff");
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fast_client(&server, 3).complete(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::HttpStatus { code: 401, .. }));
}

#[tokio::test]
async fn test_one_attempt_per_backoff_step_plus_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(4)
        .mount(&server)
        .await;

    let err = fast_client(&server, 3).complete(&request()).await.unwrap_err();
    match err {
        LlmError::RetriesExhausted(inner) => {
            assert!(matches!(*inner, LlmError::HttpStatus { code: 503, .. }));
        },
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_backoff_gives_up_after_one_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fast_client(&server, 0).complete(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::RetriesExhausted(_)));
}

#[tokio::test]
async fn test_empty_choices_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = fast_client(&server, 3).complete(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[test]
fn test_default_backoff_is_one_two_four_seconds() {
    let secs: Vec<u64> = crate::DEFAULT_RETRY_BACKOFF.iter().map(Duration::as_secs).collect();
    assert_eq!(secs, [1, 2, 4]);
}
