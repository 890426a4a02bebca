//! Shared server state.
//!
//! Holds the engine handle plus coarse request counters. Cloned into each
//! handler via Axum's State extractor.

use engine::AuctionEngine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct ServerState {
    /// The auction engine; all domain operations go through it.
    pub engine: Arc<AuctionEngine>,

    /// Server start time.
    pub start_time: Instant,

    /// Shared counters.
    pub metrics: Arc<ServerMetrics>,
}

impl ServerState {
    pub fn new(engine: Arc<AuctionEngine>) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
            metrics: Arc::new(ServerMetrics::new()),
        }
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Server-side counters.
pub struct ServerMetrics {
    /// Auctions created through this server.
    pub auctions_created: AtomicU64,
    /// Bids admitted through this server.
    pub bids_placed: AtomicU64,
    /// Bids rejected (any error kind).
    pub bids_rejected: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            auctions_created: AtomicU64::new(0),
            bids_placed: AtomicU64::new(0),
            bids_rejected: AtomicU64::new(0),
        }
    }

    pub fn auction_created(&self) {
        self.auctions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bid_placed(&self) {
        self.bids_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bid_rejected(&self) {
        self.bids_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auctions(&self) -> u64 {
        self.auctions_created.load(Ordering::Relaxed)
    }

    pub fn bids(&self) -> u64 {
        self.bids_placed.load(Ordering::Relaxed)
    }

    pub fn rejections(&self) -> u64 {
        self.bids_rejected.load(Ordering::Relaxed)
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counters() {
        let metrics = ServerMetrics::new();
        metrics.auction_created();
        metrics.bid_placed();
        metrics.bid_placed();
        metrics.bid_rejected();

        assert_eq!(metrics.auctions(), 1);
        assert_eq!(metrics.bids(), 2);
        assert_eq!(metrics.rejections(), 1);
    }
}
