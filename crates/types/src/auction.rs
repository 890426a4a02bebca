//! The auction aggregate: rounds, bids, winners, and lifecycle states.
//!
//! An `Auction` together with its `Round`s and `Bid`s forms one unit of
//! atomic update. The ledger (balances and transaction journal) is a
//! separate aggregate.

use crate::ids::{AuctionId, BidId, DurationMs, Timestamp, UserId};
use crate::money::Cash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// Lifecycle States
// =============================================================================

/// Auction lifecycle state.
///
/// The round cursor lives inside the `Active` variant so that a completed
/// or draft auction cannot carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuctionStatus {
    /// Created but not started; accepts no bids.
    Draft,
    /// Running; `current_round` is a 1-based index into `rounds`.
    #[serde(rename_all = "camelCase")]
    Active { current_round: u32 },
    /// All items awarded or all rounds played; settlement done.
    Completed,
    /// Abandoned before completion.
    Cancelled,
}

/// Round lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundStatus {
    Pending,
    Active,
    Completed,
}

// =============================================================================
// Bids, Winners, Rounds
// =============================================================================

/// A bid placed on an auction round.
///
/// Immutable once written. A carried-forward bid is a *new* record in the
/// next round with a fresh id, the original placement timestamp (used for
/// tie-breaking), and the new round number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: BidId,
    pub user_id: UserId,
    pub amount: Cash,
    /// Original placement time, preserved across carry-forward.
    pub timestamp: Timestamp,
    pub round_number: u32,
}

/// A winning slot awarded at round close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub user_id: UserId,
    pub bid_amount: Cash,
    /// 1-based leaderboard position within the round.
    pub position: u32,
}

/// One time-bounded bidding window of an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// 1-based round index.
    pub round_number: u32,
    pub start_time: Timestamp,
    /// Deadline; may be pushed forward by anti-sniping extensions, but
    /// never past `start_time + 2 * round_duration`.
    pub end_time: Timestamp,
    pub status: RoundStatus,
    /// Number of items awarded in this round (copy of the plan entry).
    pub winning_slots: u32,
    /// Ordered winners, written exactly once at round close.
    pub winners: Vec<Winner>,
    /// Count of bid records in this round, carried copies included.
    pub total_bids: u64,
}

impl Round {
    /// Open a new active round at `now`.
    pub fn open(round_number: u32, winning_slots: u32, now: Timestamp, duration: DurationMs) -> Self {
        Self {
            round_number,
            start_time: now,
            end_time: now + duration,
            status: RoundStatus::Active,
            winning_slots,
            winners: Vec::new(),
            total_bids: 0,
        }
    }

    /// Latest deadline this round may be extended to.
    pub fn max_end_time(&self, duration: DurationMs) -> Timestamp {
        self.start_time + 2 * duration
    }
}

// =============================================================================
// Auction Aggregate
// =============================================================================

/// The auction aggregate: single unit of atomic update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: AuctionId,
    pub title: String,
    pub description: String,
    /// Total supply of identical items across all rounds.
    pub total_items: u32,
    /// Items awarded per round; empty until resolved at start when only
    /// `items_per_round` was supplied.
    pub winners_per_round: Vec<u32>,
    /// Creation-time shorthand, normalized into `winners_per_round` at start.
    pub items_per_round: Option<u32>,
    pub round_duration_ms: DurationMs,
    /// Smallest admissible bid amount.
    pub min_bid: Cash,
    /// Grace window before the deadline during which a new top-K bid
    /// extends the round.
    pub anti_sniping_window_ms: DurationMs,
    pub status: AuctionStatus,
    /// Rounds in order, appended one at a time.
    pub rounds: Vec<Round>,
    /// All bid records across all rounds, carried copies included.
    pub bids: Vec<Bid>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Auction {
    /// Current round number, if the auction is active.
    pub fn current_round_number(&self) -> Option<u32> {
        match self.status {
            AuctionStatus::Active { current_round } => Some(current_round),
            _ => None,
        }
    }

    /// The round identified by the active cursor.
    pub fn current_round(&self) -> Option<&Round> {
        self.current_round_number()
            .and_then(|n| self.round(n))
    }

    /// Mutable access to the round identified by the active cursor.
    pub fn current_round_mut(&mut self) -> Option<&mut Round> {
        let n = self.current_round_number()?;
        self.rounds.iter_mut().find(|r| r.round_number == n)
    }

    /// Look up a round by its 1-based number.
    pub fn round(&self, round_number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    /// All bid records belonging to one round.
    pub fn bids_for_round(&self, round_number: u32) -> Vec<Bid> {
        self.bids
            .iter()
            .filter(|b| b.round_number == round_number)
            .cloned()
            .collect()
    }

    /// Bid records for one user across all rounds.
    pub fn bids_for_user(&self, user_id: &str) -> Vec<Bid> {
        self.bids
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Total items awarded across completed rounds.
    pub fn items_awarded(&self) -> u32 {
        self.rounds.iter().map(|r| r.winners.len() as u32).sum()
    }

    /// Users who hold a winning slot in any round.
    pub fn winner_ids(&self) -> HashSet<UserId> {
        self.rounds
            .iter()
            .flat_map(|r| r.winners.iter().map(|w| w.user_id.clone()))
            .collect()
    }

    /// Committed purchase total for one user (sum of their winning bids).
    pub fn committed_total(&self, user_id: &str) -> Cash {
        self.rounds
            .iter()
            .flat_map(|r| r.winners.iter())
            .filter(|w| w.user_id == user_id)
            .map(|w| w.bid_amount)
            .sum()
    }

    /// Whether no further rounds can produce items: the supply is awarded
    /// or the round plan is exhausted with no round still open.
    pub fn is_exhausted(&self) -> bool {
        let no_open_round = self
            .rounds
            .iter()
            .all(|r| r.status == RoundStatus::Completed);
        no_open_round
            && (self.items_awarded() >= self.total_items
                || self.rounds.len() >= self.winners_per_round.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn bid(user: &str, amount: f64, ts: Timestamp, round: u32) -> Bid {
        Bid {
            id: BidId(Ulid::new()),
            user_id: user.to_string(),
            amount: Cash::from_float(amount),
            timestamp: ts,
            round_number: round,
        }
    }

    fn draft_auction() -> Auction {
        Auction {
            id: AuctionId::new(),
            title: "test".into(),
            description: String::new(),
            total_items: 3,
            winners_per_round: vec![2, 1],
            items_per_round: None,
            round_duration_ms: 10_000,
            min_bid: Cash::from_float(1.0),
            anti_sniping_window_ms: 0,
            status: AuctionStatus::Draft,
            rounds: Vec::new(),
            bids: Vec::new(),
            created_at: 0,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_round_open_and_cap() {
        let round = Round::open(1, 2, 1_000, 10_000);
        assert_eq!(round.start_time, 1_000);
        assert_eq!(round.end_time, 11_000);
        assert_eq!(round.status, RoundStatus::Active);
        assert_eq!(round.max_end_time(10_000), 21_000);
    }

    #[test]
    fn test_current_round_lookup() {
        let mut auction = draft_auction();
        assert!(auction.current_round().is_none());

        auction.rounds.push(Round::open(1, 2, 0, 10_000));
        auction.status = AuctionStatus::Active { current_round: 1 };
        assert_eq!(auction.current_round().unwrap().round_number, 1);
    }

    #[test]
    fn test_bids_for_round_filters() {
        let mut auction = draft_auction();
        auction.bids.push(bid("u1", 5.0, 1, 1));
        auction.bids.push(bid("u2", 7.0, 2, 1));
        auction.bids.push(bid("u1", 5.0, 1, 2));

        assert_eq!(auction.bids_for_round(1).len(), 2);
        assert_eq!(auction.bids_for_round(2).len(), 1);
        assert_eq!(auction.bids_for_user("u1").len(), 2);
    }

    #[test]
    fn test_items_awarded_and_winner_ids() {
        let mut auction = draft_auction();
        let mut r1 = Round::open(1, 2, 0, 10_000);
        r1.status = RoundStatus::Completed;
        r1.winners = vec![
            Winner {
                user_id: "u1".into(),
                bid_amount: Cash::from_float(10.0),
                position: 1,
            },
            Winner {
                user_id: "u2".into(),
                bid_amount: Cash::from_float(7.0),
                position: 2,
            },
        ];
        auction.rounds.push(r1);

        assert_eq!(auction.items_awarded(), 2);
        assert!(auction.winner_ids().contains("u1"));
        assert!(!auction.winner_ids().contains("u3"));
        assert_eq!(auction.committed_total("u1"), Cash::from_float(10.0));
    }

    #[test]
    fn test_is_exhausted() {
        let mut auction = draft_auction();
        assert!(!auction.is_exhausted() || auction.rounds.is_empty());

        let mut r1 = Round::open(1, 2, 0, 10_000);
        r1.status = RoundStatus::Completed;
        auction.rounds.push(r1);
        // One of two planned rounds completed, nothing awarded yet
        assert!(!auction.is_exhausted());

        let mut r2 = Round::open(2, 1, 10_000, 10_000);
        r2.status = RoundStatus::Completed;
        auction.rounds.push(r2);
        // Round plan exhausted
        assert!(auction.is_exhausted());
    }

    #[test]
    fn test_status_serialization() {
        let status = AuctionStatus::Active { current_round: 2 };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("currentRound"));

        let draft = serde_json::to_string(&AuctionStatus::Draft).unwrap();
        assert_eq!(draft, "\"draft\"");
    }
}
