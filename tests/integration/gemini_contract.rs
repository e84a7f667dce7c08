//! Gemini gateway contract tests against a mock HTTP server.

use confab::gateway::{AiGateway, GatewayError, GeminiGateway, InlineData, TurnRequest};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::gateway_config;

const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn text_request(text: &str) -> TurnRequest {
    TurnRequest {
        message_content: Some(text.to_owned()),
        attachments: Vec::new(),
    }
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

// ── Request format ──

#[tokio::test]
async fn request_carries_text_key_and_generation_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "Hello" }] }],
            "generationConfig": { "topK": 40, "maxOutputTokens": 2048 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new(&gateway_config(&server.uri())).unwrap();
    let reply = gateway.generate(&text_request("Hello")).await.unwrap();
    assert_eq!(reply.first_candidate_text(), Some("Hi there"));
}

#[tokio::test]
async fn attachments_are_sent_as_inline_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                { "text": "What is this?" },
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("A PNG")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new(&gateway_config(&server.uri())).unwrap();
    let request = TurnRequest {
        message_content: Some("What is this?".into()),
        attachments: vec![InlineData {
            mime_type: "image/png".into(),
            data: "iVBORw0KGgo=".into(),
        }],
    };
    let reply = gateway.generate(&request).await.unwrap();
    assert_eq!(reply.first_candidate_text(), Some("A PNG"));
}

// ── Error mapping ──

#[tokio::test]
async fn status_429_is_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new(&gateway_config(&server.uri())).unwrap();
    let err = gateway.generate(&text_request("hi")).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::QuotaExceeded("Resource has been exhausted".into())
    );
}

#[tokio::test]
async fn other_statuses_keep_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new(&gateway_config(&server.uri())).unwrap();
    let err = gateway.generate(&text_request("hi")).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 400,
            message: "API key not valid".into()
        }
    );
}

#[tokio::test]
async fn non_json_success_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new(&gateway_config(&server.uri())).unwrap();
    let err = gateway.generate(&text_request("hi")).await.unwrap_err();
    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_server_is_transport_failure() {
    // Bind then drop a server so the port is closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let gateway = GeminiGateway::new(&gateway_config(&uri)).unwrap();
    let err = gateway.generate(&text_request("hi")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}
