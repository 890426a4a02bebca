//! Storage layer for auction aggregates.
//!
//! The engine consumes the `AuctionStore` trait; saves are all-or-nothing
//! per aggregate. Two implementations are provided:
//! - `MemoryStore`: process-local map, the default for tests and demos
//! - `SqliteStore`: durable aggregate-as-JSON rows with query indexes

mod memory;
mod sqlite;

use std::fmt;
use types::{Auction, AuctionId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage failure surfaced to the engine.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying database failure.
    Database(String),
    /// A stored aggregate could not be decoded.
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "store database error: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "corrupt aggregate: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable storage of auction aggregates.
///
/// `save` replaces the whole aggregate atomically; readers always observe
/// either the previous or the new version, never a partial update.
pub trait AuctionStore: Send + Sync {
    /// Insert or replace one aggregate.
    fn save(&self, auction: &Auction) -> Result<()>;

    /// Fetch one aggregate by id.
    fn find_by_id(&self, id: AuctionId) -> Result<Option<Auction>>;

    /// All auctions whose status is `Active`.
    fn find_active(&self) -> Result<Vec<Auction>>;

    /// Up to `limit` auctions, newest first.
    fn find_all(&self, limit: usize) -> Result<Vec<Auction>>;
}
