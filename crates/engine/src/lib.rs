//! Engine: the auction state machine and its round scheduler.
//!
//! `AuctionEngine` owns the lifecycle of every auction aggregate: creation,
//! start, bid admission with anti-sniping extension, round closure with
//! settlement, and the read-side projections. `RoundScheduler` is the one
//! background writer, closing rounds whose deadline has elapsed.

mod engine;
mod error;
mod scheduler;

pub use engine::{AuctionEngine, RoundLeaderboard};
pub use error::{EngineError, Result};
pub use scheduler::RoundScheduler;
