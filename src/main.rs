//! MCP gateway HTTP server - main entry point.
//!
//! Serves the gateway surface:
//! - GET  /services    - registered services with live status
//! - GET  /health      - aggregate liveness
//! - GET  /tools/list  - tools of reachable services
//! - POST /mcp         - tool proxy (legacy shape)
//! - POST /tools/call  - tool proxy (JSON-RPC shape)

use clap::Parser;
use mcp_gateway::registry::ServiceStatus;
use mcp_gateway::{observability, Config, Gateway, GatewayServer, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "mcp-gateway", version, about = "Routes and proxies MCP tool calls")]
struct Cli {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(long, env = "MCP_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(long)]
    listen: Option<String>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    config.validate()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    // Initialize observability
    observability::init_tracing(&config.observability);

    let gateway = Arc::new(Gateway::from_config(&config)?);
    let addr = config.server.socket_addr()?;

    tracing::info!("MCP gateway starting on {}", addr);
    for service in gateway.registry().services() {
        let status = gateway.checker().check(service).await;
        let mark = if status == ServiceStatus::Running { "✓" } else { "✗" };
        tracing::info!(
            "  {} {}: {} - {}",
            mark,
            service.name(),
            service.endpoint(),
            service.description()
        );
    }

    let server = GatewayServer::new(gateway, addr, config.server.max_concurrent_requests);
    let cancel = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            cancel.cancel();
        }
    });

    server.serve().await?;
    Ok(())
}
