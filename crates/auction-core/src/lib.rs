//! Auction-core: pure mechanics for the roundlot engine.
//!
//! This crate provides the side-effect-free pieces of the auction system:
//! - Leaderboard ranking over a bag of bids
//! - Round settlement planning (winners, refunds, carry-forward)
//! - The clock abstraction that drives round deadlines

mod clock;
mod ranker;
mod settlement;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ranker::{rank, LeaderboardEntry};
pub use settlement::{settle_round, BidRefund, CarryForward, SettlementPlan};
