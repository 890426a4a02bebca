//! Ledger record types: users, balances, and journal transactions.

use crate::ids::{AuctionId, BidId, Timestamp, TxId, UserId};
use crate::money::Cash;
use serde::{Deserialize, Serialize};

/// A user account with a spendable balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub username: Option<String>,
    /// Never negative; over-debits are rejected atomically.
    pub balance: Cash,
}

/// Journal entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxKind {
    /// Escrow debit taken when a bid is admitted.
    Bid,
    /// Credit returning escrowed funds.
    Refund,
    /// Committed purchase record; the bid debit becomes the price paid.
    Win,
    /// External top-up of a balance.
    Deposit,
}

/// Journal entry settlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TxStatus {
    Pending,
    #[default]
    Completed,
}

/// An append-only journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TxId,
    pub user_id: UserId,
    pub auction_id: Option<AuctionId>,
    pub kind: TxKind,
    pub amount: Cash,
    pub status: TxStatus,
    pub round_number: Option<u32>,
    pub bid_id: Option<BidId>,
    pub description: String,
    pub created_at: Timestamp,
}

impl Transaction {
    /// Build a journal entry with completed status and no auction context.
    pub fn new(
        user_id: impl Into<UserId>,
        kind: TxKind,
        amount: Cash,
        description: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: TxId::new(),
            user_id: user_id.into(),
            auction_id: None,
            kind,
            amount,
            status: TxStatus::Completed,
            round_number: None,
            bid_id: None,
            description: description.into(),
            created_at,
        }
    }

    /// Attach auction context.
    pub fn for_auction(mut self, auction_id: AuctionId, round_number: u32) -> Self {
        self.auction_id = Some(auction_id);
        self.round_number = Some(round_number);
        self
    }

    /// Attach the bid this entry settles.
    pub fn for_bid(mut self, bid_id: BidId) -> Self {
        self.bid_id = Some(bid_id);
        self
    }
}
