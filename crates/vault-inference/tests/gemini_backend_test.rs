//! Integration tests for the Gemini backend against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use vault_core::GenerationBackend;
use vault_inference::gemini::{GeminiBackend, GeminiConfig};
use vault_inference::{FailureReason, RemoteClient, RemoteOutcome};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

fn backend_for(server: &MockServer) -> GeminiBackend {
    let config = GeminiConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        timeout_secs: 5,
    };
    GeminiBackend::new(config).expect("Failed to create backend")
}

fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_returns_candidate_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("travel, packing")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let result = backend.generate("Tags please").await;

    assert_eq!(result.unwrap(), "travel, packing");
}

#[tokio::test]
async fn test_generate_json_requests_json_mime_type() {
    let mock_server = MockServer::start().await;

    // Only matches when JSON mode was requested
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(r#"{"ids": [3], "answer": "ok"}"#)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let result = backend.generate_json("Question: where?").await;

    assert_eq!(result.unwrap(), r#"{"ids": [3], "answer": "ok"}"#);
}

#[tokio::test]
async fn test_error_status_surfaces_api_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "code": 404,
                "message": "models/gemini-test is not found for API version v1beta",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let err = backend.generate("hello").await.unwrap_err().to_string();

    assert!(err.contains("404"), "got: {}", err);
    assert!(err.contains("models/gemini-test is not found"), "got: {}", err);
}

#[tokio::test]
async fn test_response_without_text_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let err = backend.generate("hello").await.unwrap_err();

    assert!(err.to_string().contains("no text"));
}

#[tokio::test]
async fn test_remote_client_times_out_slow_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_response("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = RemoteClient::new(
        Arc::new(backend_for(&mock_server)),
        Duration::from_millis(100),
    );
    let outcome = client.complete("hello").await;

    assert!(matches!(
        outcome,
        RemoteOutcome::Failure(FailureReason::Timeout(_))
    ));
}
