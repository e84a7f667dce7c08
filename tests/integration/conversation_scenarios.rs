//! End-to-end conversation turns through the session actor.

use std::time::Duration;

use confab::conversation::{
    FALLBACK_REPLY, GENERIC_FAILURE_REPLY, Origin, Phase, QUOTA_EXCEEDED_REPLY, SendOutcome,
    SendRefusal, SessionEvent, UiCommand,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{contents, gemini_session, wait_for_idle};

#[tokio::test]
async fn hello_gets_a_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "Hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hi there" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    client.set_draft("Hello").await.unwrap();
    assert!(matches!(client.send().await.unwrap(), SendOutcome::Started(_)));

    let snapshot = wait_for_idle(&client).await;
    assert_eq!(contents(&snapshot), vec!["Hello", "Hi there"]);
    let origins: Vec<_> = snapshot
        .conversation
        .messages
        .iter()
        .map(|m| m.origin())
        .collect();
    assert_eq!(origins, vec![Origin::User, Origin::Assistant]);
    assert!(snapshot.conversation.messages[0].id() < snapshot.conversation.messages[1].id());
}

#[tokio::test]
async fn rate_limit_becomes_quota_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "quota" }
        })))
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    client.set_draft("Hello").await.unwrap();
    client.send().await.unwrap();

    let snapshot = wait_for_idle(&client).await;
    assert_eq!(contents(&snapshot), vec!["Hello", QUOTA_EXCEEDED_REPLY]);
    assert_ne!(QUOTA_EXCEEDED_REPLY, GENERIC_FAILURE_REPLY);
}

#[tokio::test]
async fn server_error_becomes_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    client.set_draft("Hello").await.unwrap();
    client.send().await.unwrap();

    let snapshot = wait_for_idle(&client).await;
    assert_eq!(contents(&snapshot), vec!["Hello", GENERIC_FAILURE_REPLY]);
}

#[tokio::test]
async fn empty_candidates_use_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    client.set_draft("Hello").await.unwrap();
    client.send().await.unwrap();

    let snapshot = wait_for_idle(&client).await;
    assert_eq!(contents(&snapshot), vec!["Hello", FALLBACK_REPLY]);
}

#[tokio::test]
async fn double_send_while_pending_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": "only once" }] } }]
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    client.set_draft("Hello").await.unwrap();
    let first = client.send().await.unwrap();
    let second = client.send().await.unwrap();
    assert!(matches!(first, SendOutcome::Started(_)));
    assert_eq!(second, SendOutcome::Refused(SendRefusal::Busy));

    let snapshot = wait_for_idle(&client).await;
    assert_eq!(contents(&snapshot), vec!["Hello", "only once"]);
}

#[tokio::test]
async fn empty_send_changes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    client.set_draft("   ").await.unwrap();
    assert_eq!(
        client.send().await.unwrap(),
        SendOutcome::Refused(SendRefusal::Empty)
    );

    let snapshot = client.snapshot().await.unwrap();
    assert!(snapshot.conversation.messages.is_empty());
    assert_eq!(snapshot.conversation.phase, Phase::Idle);
}

#[tokio::test]
async fn turn_emits_ordered_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "**done**" }] } }]
        })))
        .mount(&server)
        .await;

    let client = gemini_session(&server.uri());
    let mut events = client.subscribe_events();
    client.set_draft("go").await.unwrap();
    client.send().await.unwrap();

    let mut names = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        if let SessionEvent::Ui { commands } = &event
            && commands.contains(&UiCommand::FocusInput)
        {
            names.push(event.name());
            break;
        }
        names.push(event.name());
    }
    assert_eq!(
        names,
        vec![
            "draft.changed",
            "conversation.message_appended",
            "conversation.turn_started",
            "ui.commands",
            "conversation.message_appended",
            "conversation.turn_completed",
            "ui.commands",
        ]
    );

    let snapshot = client.snapshot().await.unwrap();
    let html = snapshot.conversation.messages[1].rich_text().to_html();
    assert_eq!(html, "<p><strong>done</strong></p>");
}
