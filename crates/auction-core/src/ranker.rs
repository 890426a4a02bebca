//! Leaderboard ranking over a bag of bids.
//!
//! The ranking is the single ordering authority in the system: it drives
//! the top-K winner cut at round close, the anti-sniping "is this bid in
//! the top" test, and the leaderboard query.
//!
//! # Algorithm
//!
//! 1. Reduce the bag to one bid per user: the bid with the largest amount,
//!    taking the earliest timestamp on amount ties.
//! 2. Sort by `(-amount, +timestamp, +user_id)`.
//!
//! The final `user_id` key makes the output a total order: two users can
//! never tie. Amounts are fixed-point integers, so identical input
//! produces bit-identical output.

use serde::Serialize;
use std::collections::HashMap;
use types::{Bid, Cash, Timestamp, UserId};

/// One leaderboard row: a user's best bid in the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub amount: Cash,
    pub timestamp: Timestamp,
}

/// Rank a round's bids into the canonical leaderboard.
pub fn rank(bids: &[Bid]) -> Vec<LeaderboardEntry> {
    let mut best: HashMap<&str, &Bid> = HashMap::new();
    for bid in bids {
        let slot = best.entry(bid.user_id.as_str()).or_insert(bid);
        if beats(bid, slot) {
            *slot = bid;
        }
    }

    let mut entries: Vec<LeaderboardEntry> = best
        .into_values()
        .map(|b| LeaderboardEntry {
            user_id: b.user_id.clone(),
            amount: b.amount,
            timestamp: b.timestamp,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then(a.timestamp.cmp(&b.timestamp))
            .then(a.user_id.cmp(&b.user_id))
    });
    entries
}

/// Whether `candidate` replaces `current` as a user's best bid.
fn beats(candidate: &Bid, current: &Bid) -> bool {
    candidate.amount > current.amount
        || (candidate.amount == current.amount && candidate.timestamp < current.timestamp)
}
