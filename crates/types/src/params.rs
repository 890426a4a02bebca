//! Validated auction creation parameters.
//!
//! `winners_per_round` is the canonical round plan. Callers may instead
//! supply `items_per_round`, which is normalized at start time into
//! `[n, n, …, remainder]` with `ceil(total_items / n)` rounds.

use crate::ids::DurationMs;
use crate::money::Cash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest allowed round duration.
pub const MIN_ROUND_DURATION_MS: DurationMs = 10_000;

/// Default anti-sniping window when the caller omits one.
pub const DEFAULT_ANTI_SNIPING_WINDOW_MS: DurationMs = 10_000;

/// Parameter validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    /// `total_items` must be at least 1.
    NoItems,
    /// `items_per_round` must be at least 1 when supplied.
    ZeroItemsPerRound,
    /// Neither `items_per_round` nor `winners_per_round` was supplied.
    NoRoundPlan,
    /// `winners_per_round` must be non-empty with every element ≥ 1.
    EmptyRoundSlot,
    /// `winners_per_round` must sum to `total_items`.
    RoundPlanMismatch { sum: u32, total_items: u32 },
    /// `round_duration` must be at least 10 seconds.
    RoundDurationTooShort(DurationMs),
    /// `min_bid` must not be negative.
    NegativeMinBid,
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::NoItems => write!(f, "totalItems must be at least 1"),
            ParamsError::ZeroItemsPerRound => write!(f, "itemsPerRound must be at least 1"),
            ParamsError::NoRoundPlan => {
                write!(f, "either itemsPerRound or winnersPerRound is required")
            }
            ParamsError::EmptyRoundSlot => {
                write!(f, "winnersPerRound must be non-empty with every element >= 1")
            }
            ParamsError::RoundPlanMismatch { sum, total_items } => write!(
                f,
                "winnersPerRound sums to {} but totalItems is {}",
                sum, total_items
            ),
            ParamsError::RoundDurationTooShort(ms) => {
                write!(f, "roundDuration {}ms is below the 10s minimum", ms)
            }
            ParamsError::NegativeMinBid => write!(f, "minBid must not be negative"),
        }
    }
}

impl std::error::Error for ParamsError {}

/// Creation parameters for an auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionParams {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub total_items: u32,
    #[serde(default)]
    pub items_per_round: Option<u32>,
    #[serde(default)]
    pub winners_per_round: Option<Vec<u32>>,
    pub round_duration_ms: DurationMs,
    pub min_bid: Cash,
    #[serde(default = "default_anti_sniping_window")]
    pub anti_sniping_window_ms: DurationMs,
}

fn default_anti_sniping_window() -> DurationMs {
    DEFAULT_ANTI_SNIPING_WINDOW_MS
}

impl AuctionParams {
    /// Check all creation-time validation rules.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.total_items < 1 {
            return Err(ParamsError::NoItems);
        }
        if let Some(n) = self.items_per_round {
            if n < 1 {
                return Err(ParamsError::ZeroItemsPerRound);
            }
        }
        if let Some(plan) = &self.winners_per_round {
            if plan.is_empty() || plan.iter().any(|&k| k < 1) {
                return Err(ParamsError::EmptyRoundSlot);
            }
            let sum: u32 = plan.iter().sum();
            if sum != self.total_items {
                return Err(ParamsError::RoundPlanMismatch {
                    sum,
                    total_items: self.total_items,
                });
            }
        } else if self.items_per_round.is_none() {
            return Err(ParamsError::NoRoundPlan);
        }
        if self.round_duration_ms < MIN_ROUND_DURATION_MS {
            return Err(ParamsError::RoundDurationTooShort(self.round_duration_ms));
        }
        if self.min_bid.is_negative() {
            return Err(ParamsError::NegativeMinBid);
        }
        Ok(())
    }
}

/// Spread `total_items` into rounds of `items_per_round`, remainder last.
pub fn normalize_round_plan(total_items: u32, items_per_round: u32) -> Vec<u32> {
    let full_rounds = (total_items / items_per_round) as usize;
    let remainder = total_items % items_per_round;
    let mut plan = vec![items_per_round; full_rounds];
    if remainder > 0 {
        plan.push(remainder);
    }
    plan
}
