//! Round settlement planning.
//!
//! `settle_round` computes everything a round close needs as one pure
//! result: the winners to record, the escrow refunds owed to winners for
//! their outbid lower bids, and the losing bid records to carry into the
//! next round. The engine applies the plan against the ledger and the
//! aggregate; this module never touches either.

use crate::ranker::rank;
use types::{Bid, BidId, Cash, Timestamp, UserId, Winner};
use std::collections::HashMap;

/// Escrow refund owed to a round winner for a bid below their winning bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRefund {
    pub bid_id: BidId,
    pub user_id: UserId,
    pub amount: Cash,
}

/// A losing bid to rematerialize in the next round.
///
/// Carries the original placement timestamp so tie-breaking is preserved
/// across rounds; the funds stay escrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryForward {
    pub user_id: UserId,
    pub amount: Cash,
    pub timestamp: Timestamp,
}

/// The full outcome of closing one round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettlementPlan {
    /// Top-K leaderboard entries, positions 1..=K.
    pub winners: Vec<Winner>,
    /// Winners' same-round bids below their winning amount.
    pub winner_refunds: Vec<BidRefund>,
    /// Every bid record of every non-winner, to be re-created in the next
    /// round (if one opens).
    pub carry_forward: Vec<CarryForward>,
}

/// Plan the settlement of a round from its bids and slot count.
pub fn settle_round(bids: &[Bid], winning_slots: u32) -> SettlementPlan {
    let board = rank(bids);

    let winners: Vec<Winner> = board
        .iter()
        .take(winning_slots as usize)
        .enumerate()
        .map(|(i, entry)| Winner {
            user_id: entry.user_id.clone(),
            bid_amount: entry.amount,
            position: i as u32 + 1,
        })
        .collect();

    let winning_amounts: HashMap<&str, Cash> = winners
        .iter()
        .map(|w| (w.user_id.as_str(), w.bid_amount))
        .collect();

    let mut winner_refunds = Vec::new();
    let mut carry_forward = Vec::new();
    for bid in bids {
        match winning_amounts.get(bid.user_id.as_str()) {
            Some(&winning) => {
                if bid.amount < winning {
                    winner_refunds.push(BidRefund {
                        bid_id: bid.id,
                        user_id: bid.user_id.clone(),
                        amount: bid.amount,
                    });
                }
            }
            None => carry_forward.push(CarryForward {
                user_id: bid.user_id.clone(),
                amount: bid.amount,
                timestamp: bid.timestamp,
            }),
        }
    }

    SettlementPlan {
        winners,
        winner_refunds,
        carry_forward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(user: &str, amount: f64, ts: Timestamp) -> Bid {
        Bid {
            id: BidId::new(),
            user_id: user.to_string(),
            amount: Cash::from_float(amount),
            timestamp: ts,
            round_number: 1,
        }
    }

    #[test]
    fn test_top_k_cut() {
        let bids = vec![bid("u1", 5.0, 1), bid("u2", 10.0, 2), bid("u3", 7.0, 3)];
        let plan = settle_round(&bids, 2);

        assert_eq!(plan.winners.len(), 2);
        assert_eq!(plan.winners[0].user_id, "u2");
        assert_eq!(plan.winners[0].position, 1);
        assert_eq!(plan.winners[1].user_id, "u3");
        assert_eq!(plan.winners[1].position, 2);
    }

    #[test]
    fn test_winner_lower_bids_refunded() {
        let bids = vec![bid("u1", 4.0, 1), bid("u1", 9.0, 2), bid("u2", 2.0, 3)];
        let plan = settle_round(&bids, 1);

        assert_eq!(plan.winner_refunds.len(), 1);
        assert_eq!(plan.winner_refunds[0].user_id, "u1");
        assert_eq!(plan.winner_refunds[0].amount, Cash::from_float(4.0));
        // The winning bid itself stays debited
        assert!(plan
            .winner_refunds
            .iter()
            .all(|r| r.amount < Cash::from_float(9.0)));
    }

    #[test]
    fn test_losers_carried_with_original_timestamps() {
        let bids = vec![bid("u1", 5.0, 1), bid("u2", 3.0, 7)];
        let plan = settle_round(&bids, 1);

        assert_eq!(plan.carry_forward.len(), 1);
        assert_eq!(plan.carry_forward[0].user_id, "u2");
        assert_eq!(plan.carry_forward[0].amount, Cash::from_float(3.0));
        assert_eq!(plan.carry_forward[0].timestamp, 7);
    }

    #[test]
    fn test_every_losing_record_carries() {
        // A loser with two records (say one carried copy and one fresh bid)
        // carries both into the next round.
        let bids = vec![bid("u1", 9.0, 1), bid("u2", 3.0, 2), bid("u2", 6.0, 3)];
        let plan = settle_round(&bids, 1);

        assert_eq!(plan.carry_forward.len(), 2);
        assert!(plan.carry_forward.iter().all(|c| c.user_id == "u2"));
    }

    #[test]
    fn test_underfilled_round() {
        let bids = vec![bid("u1", 5.0, 1)];
        let plan = settle_round(&bids, 3);

        assert_eq!(plan.winners.len(), 1);
        assert!(plan.winner_refunds.is_empty());
        assert!(plan.carry_forward.is_empty());
    }

    #[test]
    fn test_zero_bids_round() {
        let plan = settle_round(&[], 2);
        assert!(plan.winners.is_empty());
        assert!(plan.winner_refunds.is_empty());
        assert!(plan.carry_forward.is_empty());
    }
}
