use anyhow::{Context, Result};
use std::net::SocketAddr;

use racecard::config::Config;
use racecard::metrics;
use racecard::server::ViewerServer;

/// Start the viewer server
pub async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if host.is_some() || port.is_some() {
        let current = config.server.bind_address;
        let host = host.unwrap_or_else(|| current.ip().to_string());
        let port = port.unwrap_or(current.port());
        config.server.bind_address = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .context("Invalid bind address")?;
    }

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }

    let bind_address = config.server.bind_address;
    let server = ViewerServer::new(config)
        .map_err(racecard::Error::from)
        .context("Failed to create viewer server")?;

    println!("{}", server.info().display());
    println!();
    println!("Endpoints:");
    println!("  GET  /                        - Race card page (?raceId=...)");
    println!("  GET  /fragments/{{id}}.html     - Single race card");
    println!("  GET  /api/races               - Resolved manifest");
    println!("  POST /api/selection           - Apply a picker change");
    println!("  GET  /api/health              - Health check");
    println!("  GET  /metrics                 - Prometheus metrics endpoint");
    println!();
    println!("Viewer listening on http://{bind_address}");
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await
        .map_err(racecard::Error::from)?;

    println!("Viewer stopped.");
    Ok(())
}
