//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use confab::config::{ChatConfig, GatewayConfig};
use confab::conversation::{Phase, SessionClient, SessionSnapshot, session_channel};
use confab::gateway::{AiGateway, GeminiGateway};
use confab::speech::{NoopRecognizer, NoopSynthesizer};

/// Gateway config pointing at a mock server.
pub fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        base_url: base_url.to_owned(),
        model: "gemini-test".to_owned(),
        api_key: Some("test-key".to_owned()),
        request_timeout_secs: 5,
        ..GatewayConfig::default()
    }
}

/// Start a session against a Gemini gateway at `base_url`.
pub fn gemini_session(base_url: &str) -> SessionClient {
    let gateway = GeminiGateway::new(&gateway_config(base_url)).unwrap();
    start_session(Arc::new(gateway))
}

/// Start a session with no-op speech backends.
pub fn start_session(gateway: Arc<dyn AiGateway>) -> SessionClient {
    let (client, server) = session_channel(
        &ChatConfig::default(),
        gateway,
        Box::new(NoopRecognizer),
        Box::new(NoopSynthesizer),
    );
    tokio::spawn(server.run());
    client
}

/// Poll until no turn is in flight.
pub async fn wait_for_idle(client: &SessionClient) -> SessionSnapshot {
    wait_until(client, |s| s.conversation.phase == Phase::Idle).await
}

/// Poll until `done` holds.
pub async fn wait_until(
    client: &SessionClient,
    done: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    for _ in 0..400 {
        let snapshot = client.snapshot().await.unwrap();
        if done(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// Message contents in order.
pub fn contents(snapshot: &SessionSnapshot) -> Vec<String> {
    snapshot
        .conversation
        .messages
        .iter()
        .map(|m| m.content().to_owned())
        .collect()
}
