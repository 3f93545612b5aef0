//! End-to-end demo of the completion bridge.
//!
//! Plays both sides of the boundary: the "native" operation is an HTTP fetch
//! running on the bridge runtime, the "managed" side submits it, receives a
//! handle synchronously, and awaits the future taken for that handle.
//!
//! Run with:
//! ```bash
//! cargo run -p bridge-runtime --example fetch_demo -- https://example.com
//! ```

use anyhow::Context as _;
use bridge_runtime::logging::LoggingConfig;
use bridge_runtime::{init, BridgeConfig, NativeError};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    let runtime = init(
        BridgeConfig::default()
            .with_worker_threads(4)
            .with_logging(LoggingConfig::default()),
    )?;

    info!(url = %url, "submitting fetch to the bridge runtime");

    let handle = runtime.submit(async move {
        let response = reqwest::get(&url).await.map_err(|e| NativeError {
            code: 1,
            message: e.to_string(),
        })?;
        let body = response.bytes().await.map_err(|e| NativeError {
            code: 2,
            message: e.to_string(),
        })?;
        Ok(body.to_vec())
    });

    info!(handle = %handle, "handle returned synchronously; awaiting completion");

    let future = runtime
        .take(handle)
        .context("operation resolved before it could be taken")?;
    let body = runtime.block_on(future)?;

    info!(bytes = body.len(), "fetch completed");
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}
