//! Axum application builder.
//!
//! Configures routes, middleware, and state for the server.

use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{auctions, health, users};
use crate::state::ServerState;

/// Create the Axum application with all routes.
pub fn create_app(state: ServerState) -> Router {
    // CORS layer for frontend development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Health endpoints
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        // Auction endpoints
        .route("/api/auctions", post(auctions::create).get(auctions::active))
        .route("/api/auctions/all", get(auctions::all))
        .route("/api/auctions/:id", get(auctions::get))
        .route("/api/auctions/:id/start", post(auctions::start))
        .route("/api/auctions/:id/bids", post(auctions::place_bid))
        .route("/api/auctions/:id/close-round", post(auctions::close_round))
        .route(
            "/api/auctions/:id/rounds/:round/leaderboard",
            get(auctions::leaderboard),
        )
        .route(
            "/api/auctions/:id/users/:user_id/bids",
            get(auctions::user_bids),
        )
        // User endpoints
        .route("/api/users", post(users::get_or_create))
        .route("/api/users/:id", get(users::get))
        .route("/api/users/:id/balance", get(users::balance))
        .route("/api/users/:id/deposit", post(users::deposit))
        .route("/api/users/:id/transactions", get(users::transactions))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Server configuration.
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".into(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let port = std::env::var("ROUNDLOT_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("ROUNDLOT_HOST").unwrap_or_else(|_| "0.0.0.0".into());

        Self { port, host }
    }

    /// Get bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_core::{Clock, SystemClock};
    use engine::AuctionEngine;
    use ledger::Ledger;
    use std::sync::Arc;
    use store::{AuctionStore, MemoryStore};
    use types::Cash;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_create_app() {
        let store: Arc<dyn AuctionStore> = Arc::new(MemoryStore::new());
        let ledger = Arc::new(Ledger::new(Cash::from_float(1000.0)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let engine = Arc::new(AuctionEngine::new(store, ledger, clock));

        let _app = create_app(ServerState::new(engine));
        // App created successfully
    }
}
