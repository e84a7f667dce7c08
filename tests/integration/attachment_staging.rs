//! Staging files through the session: allow-list, ordering, previews.

use std::io::Write as _;

use base64::Engine as _;
use confab::attachment::{AttachmentCategory, FileSelection, PreviewSource};
use confab::conversation::SendOutcome;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{contents, gemini_session, wait_for_idle, wait_until};

fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

#[tokio::test]
async fn unsupported_file_never_stages() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_file(&dir, "archive.zip", b"PK\x03\x04");
    let notes = write_file(&dir, "notes.txt", b"remember the milk");

    let client = gemini_session("http://127.0.0.1:9");
    let queued = client
        .stage_files(vec![
            FileSelection::from_path(&zip, "application/zip"),
            FileSelection::from_path(&notes, "text/plain"),
        ])
        .await
        .unwrap();
    assert_eq!(queued, 1);

    let snapshot = wait_until(&client, |s| s.conversation.staged.len() == 1).await;
    let staged = &snapshot.conversation.staged[0];
    assert_eq!(staged.display_name, "notes.txt");
    assert_eq!(staged.category, AttachmentCategory::Text);
    assert!(snapshot.conversation.messages.is_empty());
}

#[tokio::test]
async fn staged_list_follows_selection_order() {
    let dir = tempfile::tempdir().unwrap();
    // A large first file so its read tends to finish last.
    let big = write_file(&dir, "big.csv", &vec![b'a'; 4 * 1024 * 1024]);
    let small = write_file(&dir, "small.md", b"# hi");
    let tiny = write_file(&dir, "tiny.json", b"{}");

    let client = gemini_session("http://127.0.0.1:9");
    client
        .stage_files(vec![
            FileSelection::from_path(&big, "text/csv"),
            FileSelection::from_path(&small, "text/markdown"),
            FileSelection::from_path(&tiny, "application/json"),
        ])
        .await
        .unwrap();

    let snapshot = wait_until(&client, |s| s.conversation.staged.len() == 3).await;
    let names: Vec<_> = snapshot
        .conversation
        .staged
        .iter()
        .map(|a| a.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["big.csv", "small.md", "tiny.json"]);
    assert_eq!(snapshot.live_previews, 3);
}

#[tokio::test]
async fn unreadable_file_is_dropped() {
    let client = gemini_session("http://127.0.0.1:9");
    let queued = client
        .stage_files(vec![FileSelection::from_path(
            "/definitely/not/here.png",
            "image/png",
        )])
        .await
        .unwrap();
    assert_eq!(queued, 1);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let snapshot = client.snapshot().await.unwrap();
    assert!(snapshot.conversation.staged.is_empty());
    assert_eq!(snapshot.live_previews, 0);
}

#[tokio::test]
async fn send_moves_attachments_and_releases_previews() {
    let bytes = b"\x89PNG\r\n\x1a\nfake";
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                { "inlineData": { "mimeType": "image/png", "data": encoded } }
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "A picture" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let png = write_file(&dir, "cat.png", bytes);
    let client = gemini_session(&server.uri());
    client
        .stage_files(vec![FileSelection::from_path(&png, "image/png")])
        .await
        .unwrap();
    let staged = wait_until(&client, |s| s.conversation.staged.len() == 1).await;
    let preview = staged.conversation.staged[0].preview.clone();
    assert_eq!(
        client.resolve_preview(preview.clone()).await.unwrap(),
        Some(PreviewSource::File {
            path: png.clone(),
            mime_type: "image/png".to_owned(),
        })
    );

    // Attachment only, no text.
    assert!(matches!(client.send().await.unwrap(), SendOutcome::Started(_)));
    let snapshot = wait_for_idle(&client).await;

    assert_eq!(contents(&snapshot), vec!["", "A picture"]);
    let sent = &snapshot.conversation.messages[0];
    assert_eq!(sent.attachments().len(), 1);
    assert_eq!(sent.attachments()[0].decode().unwrap(), bytes.to_vec());
    assert!(snapshot.conversation.staged.is_empty());
    assert_eq!(snapshot.live_previews, 0);
    assert_eq!(client.resolve_preview(preview).await.unwrap(), None);
}

#[tokio::test]
async fn removing_staged_attachment_releases_preview() {
    let client = gemini_session("http://127.0.0.1:9");
    client
        .stage_files(vec![FileSelection::from_data_url(
            "clip.wav",
            "audio/wav",
            "data:audio/wav;base64,UklGRg==",
        )])
        .await
        .unwrap();
    let snapshot = wait_until(&client, |s| s.conversation.staged.len() == 1).await;
    assert_eq!(snapshot.conversation.staged[0].data, "UklGRg==");
    let preview = snapshot.conversation.staged[0].preview.clone();

    assert_eq!(
        client.resolve_preview(preview.clone()).await.unwrap(),
        Some(PreviewSource::DataUrl {
            url: "data:audio/wav;base64,UklGRg==".to_owned()
        })
    );

    assert!(client.remove_attachment(preview.clone()).await.unwrap());
    assert!(!client.remove_attachment(preview.clone()).await.unwrap());
    assert_eq!(client.resolve_preview(preview).await.unwrap(), None);

    let snapshot = client.snapshot().await.unwrap();
    assert!(snapshot.conversation.staged.is_empty());
    assert_eq!(snapshot.live_previews, 0);
}
