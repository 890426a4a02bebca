//! Core types for the roundlot auction engine.
//!
//! This crate provides all shared data types used across the system:
//! identifier newtypes, fixed-point monetary values, the auction aggregate
//! with its rounds and bids, ledger records, and validated auction
//! parameters.

mod auction;
mod ids;
mod ledger;
mod money;
mod params;

pub use auction::{Auction, AuctionStatus, Bid, Round, RoundStatus, Winner};
pub use ids::{AuctionId, BidId, DurationMs, Timestamp, TxId, UserId};
pub use ledger::{Transaction, TxKind, TxStatus, User};
pub use money::{Cash, CASH_SCALE};
pub use params::{
    normalize_round_plan, AuctionParams, ParamsError, DEFAULT_ANTI_SNIPING_WINDOW_MS,
    MIN_ROUND_DURATION_MS,
};
