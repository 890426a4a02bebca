//! Process-local auction store.

use crate::{AuctionStore, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use types::{Auction, AuctionId, AuctionStatus};

/// In-memory store backed by a read-write lock.
///
/// Aggregates are cloned on the way in and out, so readers hold a
/// consistent snapshot and never see a caller's in-progress mutation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    auctions: RwLock<HashMap<AuctionId, Auction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuctionStore for MemoryStore {
    fn save(&self, auction: &Auction) -> Result<()> {
        self.auctions.write().insert(auction.id, auction.clone());
        Ok(())
    }

    fn find_by_id(&self, id: AuctionId) -> Result<Option<Auction>> {
        Ok(self.auctions.read().get(&id).cloned())
    }

    fn find_active(&self) -> Result<Vec<Auction>> {
        Ok(self
            .auctions
            .read()
            .values()
            .filter(|a| matches!(a.status, AuctionStatus::Active { .. }))
            .cloned()
            .collect())
    }

    fn find_all(&self, limit: usize) -> Result<Vec<Auction>> {
        let mut all: Vec<Auction> = self.auctions.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }
}
