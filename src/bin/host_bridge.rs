//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin,
//! routes them to a conversation session, and writes `ResponseEnvelope` and
//! `EventEnvelope` messages to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use confab::config::ChatConfig;
use confab::host::run_stdio_bridge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("confab=info")),
        )
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ChatConfig::default_config_path);
    let config = if config_path.exists() {
        ChatConfig::from_file(&config_path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config_path.display()))?
    } else {
        tracing::info!(path = %config_path.display(), "no config file; using defaults");
        ChatConfig::default()
    };

    tracing::info!(model = %config.gateway.model, "confab-host starting");

    run_stdio_bridge(&config).await.map_err(|e| {
        tracing::error!(error = %e, "confab-host exited with error");
        anyhow::anyhow!("confab-host failed: {e}")
    })?;

    tracing::info!("confab-host shut down cleanly");
    Ok(())
}
