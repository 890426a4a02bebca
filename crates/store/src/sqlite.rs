//! SQLite-backed auction store.
//!
//! Aggregates are stored whole as JSON rows; the status and round cursor
//! are denormalized into columns for the scheduler's candidate query, and
//! a bids mirror table carries the per-user/per-round index.

use crate::{AuctionStore, Result, StoreError};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use types::{Auction, AuctionId, AuctionStatus};

/// Durable store keeping each aggregate as one JSON row.
///
/// A save rewrites the aggregate row and its bid mirror rows inside one
/// SQLite transaction, so readers never observe a partial update.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `path`. Use `:memory:` for ephemeral.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // Aggregates, one JSON row each, with denormalized scheduler columns
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auctions (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            current_round INTEGER,
            created_at INTEGER NOT NULL,
            data TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_auctions_status
         ON auctions(status, current_round)",
        [],
    )?;

    // Bid mirror for per-user / per-round lookups
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auction_bids (
            auction_id TEXT NOT NULL,
            bid_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            round_number INTEGER NOT NULL,
            PRIMARY KEY (auction_id, bid_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_auction_bids_user
         ON auction_bids(user_id, round_number)",
        [],
    )?;

    Ok(())
}

/// Column value for the status filter.
fn status_label(status: &AuctionStatus) -> &'static str {
    match status {
        AuctionStatus::Draft => "draft",
        AuctionStatus::Active { .. } => "active",
        AuctionStatus::Completed => "completed",
        AuctionStatus::Cancelled => "cancelled",
    }
}

fn decode_row(data: String) -> Result<Auction> {
    serde_json::from_str(&data).map_err(StoreError::from)
}

impl AuctionStore for SqliteStore {
    fn save(&self, auction: &Auction) -> Result<()> {
        let data = serde_json::to_string(auction)?;
        let id = auction.id.to_string();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO auctions (id, status, current_round, created_at, data)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 current_round = excluded.current_round,
                 data = excluded.data",
            params![
                id,
                status_label(&auction.status),
                auction.current_round_number(),
                auction.created_at as i64,
                data
            ],
        )?;

        tx.execute("DELETE FROM auction_bids WHERE auction_id = ?1", params![id])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO auction_bids (auction_id, bid_id, user_id, round_number)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for bid in &auction.bids {
                insert.execute(params![id, bid.id.to_string(), bid.user_id, bid.round_number])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn find_by_id(&self, id: AuctionId) -> Result<Option<Auction>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT data FROM auctions WHERE id = ?1")?;
        let mut rows = stmt.query(params![id.to_string()])?;

        match rows.next()? {
            Some(row) => Ok(Some(decode_row(row.get(0)?)?)),
            None => Ok(None),
        }
    }

    fn find_active(&self) -> Result<Vec<Auction>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT data FROM auctions WHERE status = 'active'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut auctions = Vec::new();
        for data in rows {
            auctions.push(decode_row(data?)?);
        }
        Ok(auctions)
    }

    fn find_all(&self, limit: usize) -> Result<Vec<Auction>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT data FROM auctions ORDER BY created_at DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

        let mut auctions = Vec::new();
        for data in rows {
            auctions.push(decode_row(data?)?);
        }
        Ok(auctions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Bid, BidId, Cash, Round};

    fn auction(created_at: u64) -> Auction {
        Auction {
            id: AuctionId::new(),
            title: "test".into(),
            description: String::new(),
            total_items: 2,
            winners_per_round: vec![1, 1],
            items_per_round: None,
            round_duration_ms: 10_000,
            min_bid: Cash::from_float(1.0),
            anti_sniping_window_ms: 0,
            status: AuctionStatus::Draft,
            rounds: Vec::new(),
            bids: Vec::new(),
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_roundtrip_preserves_aggregate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut a = auction(1);
        a.status = AuctionStatus::Active { current_round: 1 };
        a.rounds.push(Round::open(1, 1, 0, 10_000));
        a.bids.push(Bid {
            id: BidId::new(),
            user_id: "u1".into(),
            amount: Cash::from_float(5.0),
            timestamp: 3,
            round_number: 1,
        });
        store.save(&a).unwrap();

        let found = store.find_by_id(a.id).unwrap().unwrap();
        assert_eq!(found, a);
    }

    #[test]
    fn test_save_is_upsert() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut a = auction(1);
        store.save(&a).unwrap();

        a.status = AuctionStatus::Completed;
        store.save(&a).unwrap();

        let found = store.find_by_id(a.id).unwrap().unwrap();
        assert_eq!(found.status, AuctionStatus::Completed);
        assert_eq!(store.find_all(10).unwrap().len(), 1);
    }

    #[test]
    fn test_find_active() {
        let store = SqliteStore::open_in_memory().unwrap();
        let draft = auction(1);
        let mut active = auction(2);
        active.status = AuctionStatus::Active { current_round: 1 };
        store.save(&draft).unwrap();
        store.save(&active).unwrap();

        let found = store.find_active().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, active.id);
    }

    #[test]
    fn test_find_all_ordering_and_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.save(&auction(i)).unwrap();
        }

        let found = store.find_all(2).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].created_at, 4);
        assert_eq!(found[1].created_at, 3);
    }

    #[test]
    fn test_missing_auction_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.find_by_id(AuctionId::new()).unwrap().is_none());
    }
}
