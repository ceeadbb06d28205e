//! Vendora — marketplace advertising subsystem.
//!
//! Main entry point that wires the store, services, and background scans
//! together and starts the GraphQL server.

use clap::Parser;
use std::sync::Arc;
use tracing::info;

use vendora_ads::{AdService, AdStore};
use vendora_core::config::AppConfig;
use vendora_core::event_bus::TracingSink;
use vendora_graphql::{create_schema, server};
use vendora_scheduler::{spawn_scans, AdScans, SlotAllocator};

#[derive(Parser, Debug)]
#[command(name = "vendora-server")]
#[command(about = "Marketplace advertising subsystem")]
#[command(version)]
struct Cli {
    /// Bind host (overrides config)
    #[arg(long, env = "VENDORA__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "VENDORA__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Skip the background scans (API-only mode)
    #[arg(long, default_value_t = false)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vendora=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Vendora starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }

    info!(
        host = %config.api.host,
        http_port = config.api.http_port,
        activation_interval = config.scheduler.activation_interval_secs,
        expiration_interval = config.scheduler.expiration_interval_secs,
        "Configuration loaded"
    );

    let store = Arc::new(AdStore::new());
    let events = Arc::new(TracingSink);
    let ads = Arc::new(AdService::new(store.clone(), events.clone()));
    let allocator = Arc::new(SlotAllocator::new(store.clone(), events));

    if cli.no_scheduler {
        info!("Running in API-only mode (no background scans)");
    } else {
        let scans = Arc::new(AdScans::new(store.clone(), config.scheduler.clone()));
        let handles = spawn_scans(scans, &config.scheduler);
        info!(tasks = handles.len(), "Background scans started");
    }

    let schema = create_schema(ads, allocator);

    info!("Vendora is ready to serve traffic");

    server::start_server(schema, &config.api.host, config.api.http_port).await?;

    Ok(())
}
