//! eventops-server - Event-operations service for a single live event
//!
//! Serves the DJ song-request queue (free, priority and VIP tiers with an
//! approval workflow), time-windowed pricing discounts, and the singleton
//! event configuration. Attendee pages poll the public endpoints; the
//! staff dashboard drives the role-guarded ones.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use eventops_common::db::init_database;
use eventops_common::time::SystemClock;
use eventops_server::{build_router, storage::LocalProofStore, AppState};

#[derive(Debug, Parser)]
#[command(name = "eventops-server", about = "Event-operations service")]
struct Args {
    /// Data directory (database and proof images live here)
    #[arg(long, env = "EVENTOPS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "EVENTOPS_PORT", default_value_t = 5750)]
    port: u16,
}

/// Data directory resolution: CLI arg > environment > OS default
fn resolve_data_dir(cli: Option<PathBuf>) -> PathBuf {
    cli.unwrap_or_else(|| {
        dirs::data_local_dir()
            .map(|d| d.join("eventops"))
            .unwrap_or_else(|| PathBuf::from("./eventops_data"))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting eventops-server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let data_dir = resolve_data_dir(args.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    info!("Data directory: {}", data_dir.display());

    let db_path = data_dir.join("eventops.db");
    let pool = init_database(&db_path).await?;
    info!("✓ Database ready: {}", db_path.display());

    let proofs_dir = data_dir.join("proofs");
    let store = LocalProofStore::new(proofs_dir.clone())?;
    info!("✓ Proof storage ready: {}", proofs_dir.display());

    let state = AppState::new(pool, Arc::new(SystemClock), Arc::new(store));
    let app = build_router(state, proofs_dir);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("eventops-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
