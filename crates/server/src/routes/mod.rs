//! Route handlers grouped by domain.

pub mod auctions;
pub mod health;
pub mod users;

use crate::error::AppError;
use std::str::FromStr;
use types::AuctionId;

/// Parse a path segment into an auction id, rejecting malformed ids
/// before they reach the engine.
pub(crate) fn parse_auction_id(raw: &str) -> Result<AuctionId, AppError> {
    AuctionId::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("malformed auction id: {}", raw)))
}
