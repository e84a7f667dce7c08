//! JSON-lines host bridge driven over in-memory pipes.

use std::time::Duration;

use confab::host::{HostRouter, run_bridge};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::gemini_session;

struct Harness {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    bridge: tokio::task::JoinHandle<confab::Result<()>>,
}

impl Harness {
    fn start(base_url: &str) -> Self {
        let client = gemini_session(base_url);
        let (input, bridge_in) = tokio::io::duplex(64 * 1024);
        let (bridge_out, output) = tokio::io::duplex(64 * 1024);
        let bridge = tokio::spawn(run_bridge(
            HostRouter::new(client),
            BufReader::new(bridge_in),
            bridge_out,
        ));
        Self {
            input,
            output: BufReader::new(output).lines(),
            bridge,
        }
    }

    async fn send(&mut self, request_id: &str, command: &str, payload: Value) {
        let line = json!({
            "v": 1,
            "request_id": request_id,
            "command": command,
            "payload": payload,
        })
        .to_string();
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
    }

    async fn next(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(2), self.output.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }

    /// Skip events until the response for `request_id`.
    async fn response(&mut self, request_id: &str) -> Value {
        loop {
            let value = self.next().await;
            if value["request_id"] == request_id {
                return value;
            }
        }
    }

    /// Skip until an event named `name`.
    async fn event(&mut self, name: &str) -> Value {
        loop {
            let value = self.next().await;
            if value["event"] == name {
                return value;
            }
        }
    }
}

#[tokio::test]
async fn ping_and_stop() {
    let mut harness = Harness::start("http://127.0.0.1:9");
    harness.send("p1", "host.ping", json!({})).await;
    let resp = harness.response("p1").await;
    assert_eq!(resp["ok"], true);
    assert_eq!(resp["payload"]["pong"], true);

    harness.send("s1", "runtime.stop", json!({})).await;
    let resp = harness.response("s1").await;
    assert_eq!(resp["payload"]["stopping"], true);
    harness.bridge.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_line_gets_parse_error() {
    let mut harness = Harness::start("http://127.0.0.1:9");
    harness.input.write_all(b"{not json\n").await.unwrap();
    let resp = harness.response("parse-error").await;
    assert_eq!(resp["ok"], false);
}

#[tokio::test]
async fn send_turn_and_read_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hi there" }] } }]
        })))
        .mount(&server)
        .await;

    let mut harness = Harness::start(&server.uri());
    harness
        .send("r1", "conversation.send", json!({ "text": "Hello" }))
        .await;
    let resp = harness.response("r1").await;
    assert_eq!(resp["payload"]["status"], "started");

    let completed = harness.event("conversation.turn_completed").await;
    assert_eq!(completed["v"], 1);
    assert_eq!(completed["payload"]["outcome"]["kind"], "replied");
    assert_eq!(completed["payload"]["outcome"]["text"], "Hi there");

    harness.send("r2", "conversation.snapshot", json!({})).await;
    let snapshot = harness.response("r2").await;
    let messages = snapshot["payload"]["conversation"]["messages"]
        .as_array()
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["content"], "Hi there");
    assert_eq!(messages[1]["origin"], "assistant");
}

#[tokio::test]
async fn playback_toggle_of_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Read me" }] } }]
        })))
        .mount(&server)
        .await;

    let mut harness = Harness::start(&server.uri());
    harness
        .send("r1", "conversation.send", json!({ "text": "Hello" }))
        .await;
    harness.event("conversation.turn_completed").await;

    harness
        .send("r2", "playback.toggle", json!({ "message_id": 2 }))
        .await;
    let resp = harness.response("r2").await;
    assert_eq!(resp["payload"]["playback"]["state"], "speaking");

    harness
        .send("r3", "playback.toggle", json!({ "message_id": 2 }))
        .await;
    let resp = harness.response("r3").await;
    assert_eq!(resp["payload"]["playback"]["state"], "idle");

    harness
        .send("r4", "playback.toggle", json!({ "message_id": 99 }))
        .await;
    let resp = harness.response("r4").await;
    assert_eq!(resp["ok"], false);
}
