//! Newline-delimited JSON bridge for the host contract.
//!
//! Reads `CommandEnvelope` lines, routes them through a [`HostRouter`], and
//! writes `ResponseEnvelope` and `EventEnvelope` lines back.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;

use crate::config::ChatConfig;
use crate::conversation::session_channel;
use crate::error::{ChatError, Result};
use crate::gateway::{AiGateway, GeminiGateway};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use crate::host::router::{HostRouter, event_envelope};
use crate::speech::{NoopRecognizer, NoopSynthesizer};

type SharedWriter<W> = Arc<Mutex<W>>;

/// Run the bridge on stdin/stdout with the Gemini gateway and no-op speech
/// backends, until stdin closes or `runtime.stop` arrives.
///
/// # Errors
///
/// Returns an error if the gateway cannot be built or stdio fails.
pub async fn run_stdio_bridge(config: &ChatConfig) -> Result<()> {
    let gateway: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(&config.gateway)?);
    let (client, server) = session_channel(
        config,
        gateway,
        Box::new(NoopRecognizer),
        Box::new(NoopSynthesizer),
    );
    let server_handle = tokio::spawn(server.run());

    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    let result = run_bridge(HostRouter::new(client), reader, writer).await;

    // The router (and with it the last client) is dropped, so the server exits.
    let _ = server_handle.await;
    result
}

/// Serve `router` over an arbitrary line reader and writer.
///
/// Events are forwarded concurrently with command handling.
///
/// # Errors
///
/// Returns an error on read or write failure.
pub async fn run_bridge<R, W>(router: HostRouter, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = Arc::new(Mutex::new(writer));

    let event_writer = Arc::clone(&writer);
    let mut event_rx = router.session().subscribe_events();
    let event_handle = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let envelope = event_envelope(&event);
                    match serde_json::to_string(&envelope) {
                        Ok(json) => {
                            if let Err(e) = write_line(&event_writer, &json).await {
                                tracing::warn!(error = %e, "failed to write event; stopping event forwarder");
                                break;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "failed to serialize event envelope; skipping"),
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event forwarder lagged; some events were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = run_reader(router, reader, &writer).await;

    event_handle.abort();
    let _ = event_handle.await;
    result
}

async fn run_reader<R, W>(router: HostRouter, mut reader: R, writer: &SharedWriter<W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| ChatError::Channel(format!("failed to read command: {e}")))?;
        if bytes_read == 0 {
            tracing::info!("input closed; shutting down bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<CommandEnvelope>(trimmed) {
            Ok(envelope) => {
                let is_stop = envelope.command == CommandName::RuntimeStop;
                let response = router.route(&envelope).await;
                write_response(writer, &response).await?;
                if is_stop {
                    tracing::info!("runtime.stop received; shutting down bridge");
                    break;
                }
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "failed to parse command envelope");
                ResponseEnvelope::error("parse-error", format!("failed to parse command envelope: {e}"))
            }
        };
        write_response(writer, &response).await?;
    }
    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &SharedWriter<W>,
    response: &ResponseEnvelope,
) -> Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| ChatError::Channel(format!("failed to serialize response envelope: {e}")))?;
    write_line(writer, &json).await
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &SharedWriter<W>, json: &str) -> Result<()> {
    let mut w = writer.lock().await;
    w.write_all(json.as_bytes()).await?;
    w.write_all(b"\n").await?;
    w.flush().await?;
    Ok(())
}
