//! weerelay client binary.
//!
//! Connects to the configured relay, folds the event stream into the session
//! model, and traces change descriptors as they are published. A real
//! presentation layer consumes the same handle this binary does.

use tracing_subscriber::{fmt, EnvFilter};

use weerelay_client::{config, RelayClient};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "weerelay.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");

    tracing::info!(address = %cfg.relay.address, "weerelay starting");

    let client = RelayClient::new(cfg).expect("client init failed");
    let metrics = client.metrics();
    let mut handle = client.connect().await.expect("connect failed");

    while let Some(change) = handle.next_change().await {
        tracing::debug!(?change, "session change");
    }

    tracing::info!("\n{}", metrics.render());
    if let Err(e) = handle.join().await {
        tracing::error!(error = %e, "session ended");
        std::process::exit(1);
    }
}
