//! HTTP gateway against the `generateContent` REST endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{AiGateway, GENERATION_CONFIG, GatewayError, GatewayReply, TurnRequest};
use crate::config::GatewayConfig;

/// Gemini REST gateway.
pub struct GeminiGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGateway {
    /// Build a gateway from config, resolving the API key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(format!("client setup failed: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Request body for one turn.
    pub fn build_body(request: &TurnRequest) -> Value {
        let mut parts = Vec::with_capacity(request.attachments.len() + 1);
        if let Some(text) = request.message_content.as_deref()
            && !text.is_empty()
        {
            parts.push(json!({ "text": text }));
        }
        for attachment in &request.attachments {
            parts.push(json!({
                "inlineData": {
                    "mimeType": attachment.mime_type,
                    "data": attachment.data,
                }
            }));
        }
        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": GENERATION_CONFIG,
        })
    }

    fn map_http_error(status: reqwest::StatusCode, body: &str) -> GatewayError {
        let message = extract_error_message(body);
        match status.as_u16() {
            429 => GatewayError::QuotaExceeded(message),
            code => GatewayError::Status {
                status: code,
                message,
            },
        }
    }
}

/// Extract `error.message` from an error body, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl AiGateway for GeminiGateway {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &TurnRequest) -> Result<GatewayReply, GatewayError> {
        let started = Instant::now();
        info!(
            model = %self.model,
            attachments = request.attachments.len(),
            "gateway call started"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "gateway transport failure");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to read body: {e}")))?;
        let elapsed_ms = started.elapsed().as_millis();

        if !status.is_success() {
            let err = Self::map_http_error(status, &body);
            warn!(status = status.as_u16(), elapsed_ms, error = %err, "gateway call failed");
            return Err(err);
        }

        info!(elapsed_ms, "gateway call finished");
        serde_json::from_str(&body).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}
