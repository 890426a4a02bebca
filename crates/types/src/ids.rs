//! Identifier types for the auction engine.
//!
//! Auctions, bids, and ledger transactions carry globally-unique opaque
//! ids (ULIDs); users are identified by caller-supplied strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

// =============================================================================
// Core ID Types
// =============================================================================

/// Unique identifier for an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuctionId(pub Ulid);

impl AuctionId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for AuctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuctionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Ulid::from_str(s)?))
    }
}

/// Unique identifier for a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BidId(pub Ulid);

impl BidId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for BidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub Ulid);

impl TxId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// User & Time Types
// =============================================================================

/// Caller-supplied user identifier (opaque to the engine).
pub type UserId = String;

/// Wall clock timestamp in milliseconds since epoch.
pub type Timestamp = u64;

/// Duration in milliseconds.
pub type DurationMs = u64;
