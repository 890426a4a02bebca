//! Roundlot - multi-round allocation auction service.
//!
//! # Architecture
//!
//! The HTTP server and the round scheduler share one engine:
//!
//! ```text
//! ┌────────────┐  place_bid / queries  ┌────────────────┐
//! │ Axum server│ ────────────────────► │  AuctionEngine │──► Store
//! └────────────┘                       │  (per-auction  │──► Ledger
//! ┌────────────┐     close_round       │   serialization)│
//! │ Scheduler  │ ────────────────────► └────────────────┘
//! └────────────┘   (5s cadence)
//! ```

mod config;

use std::sync::Arc;

use auction_core::{Clock, SystemClock};
use engine::{AuctionEngine, RoundScheduler};
use ledger::Ledger;
use server::{create_app, ServerConfig, ServerState};
use store::{AuctionStore, MemoryStore, SqliteStore};
use tracing::info;

pub use config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();

    let store: Arc<dyn AuctionStore> = match &config.db_path {
        Some(path) => {
            info!(path = %path, "using sqlite auction store");
            Arc::new(SqliteStore::open(path)?)
        }
        None => {
            info!("using in-memory auction store");
            Arc::new(MemoryStore::new())
        }
    };

    let ledger = Arc::new(Ledger::new(config.initial_balance));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = Arc::new(AuctionEngine::new(
        Arc::clone(&store),
        Arc::clone(&ledger),
        Arc::clone(&clock),
    ));

    // The one writer not driven by an API call
    let scheduler = RoundScheduler::new(Arc::clone(&store), Arc::clone(&engine), Arc::clone(&clock))
        .with_period(config.scheduler_period);
    let scheduler_handle = scheduler.spawn();

    let server_config = ServerConfig::from_env();
    let app = create_app(ServerState::new(engine));
    let listener = tokio::net::TcpListener::bind(server_config.bind_addr()).await?;
    info!(addr = %server_config.bind_addr(), "roundlot listening");

    axum::serve(listener, app).await?;

    scheduler_handle.abort();
    Ok(())
}
