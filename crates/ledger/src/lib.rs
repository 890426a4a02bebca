//! User ledger: balances plus an append-only transaction journal.
//!
//! The ledger is its own aggregate, separate from auctions. Every balance
//! change is a single atomic `adjust` call; over-debits are rejected
//! without touching the balance. The journal records every settlement
//! event (bid escrow, refunds, wins, deposits) in insertion order and is
//! never reordered.

use parking_lot::Mutex;
use std::collections::HashMap;
use types::{AuctionId, Cash, Transaction, User, UserId};

/// Balance adjustment failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The user does not exist.
    UnknownUser(UserId),
    /// A debit would take the balance below zero.
    InsufficientBalance { balance: Cash, requested: Cash },
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::UnknownUser(id) => write!(f, "unknown user: {}", id),
            LedgerError::InsufficientBalance { balance, requested } => {
                write!(
                    f,
                    "insufficient balance: have {}, requested {}",
                    balance, requested
                )
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Default)]
struct LedgerInner {
    users: HashMap<UserId, User>,
    journal: Vec<Transaction>,
}

/// In-process ledger guarding users and journal behind one mutex, so a
/// balance change and its journal entry commit together.
#[derive(Debug)]
pub struct Ledger {
    inner: Mutex<LedgerInner>,
    initial_balance: Cash,
}

impl Ledger {
    /// Create a ledger seeding new accounts with `initial_balance`.
    pub fn new(initial_balance: Cash) -> Self {
        Self {
            inner: Mutex::new(LedgerInner::default()),
            initial_balance,
        }
    }

    /// Look up a user.
    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.inner.lock().users.get(user_id).cloned()
    }

    /// Fetch a user, creating the account with the seed balance if absent.
    pub fn get_or_create(&self, user_id: &str, username: Option<String>) -> User {
        let mut inner = self.inner.lock();
        inner
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| User {
                user_id: user_id.to_string(),
                username,
                balance: self.initial_balance,
            })
            .clone()
    }

    /// Atomically apply a signed balance change.
    ///
    /// A negative `delta` (debit) fails with `InsufficientBalance` if it
    /// would take the balance below zero; the balance is untouched on
    /// failure.
    pub fn adjust(&self, user_id: &str, delta: Cash) -> Result<User> {
        let mut inner = self.inner.lock();
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::UnknownUser(user_id.to_string()))?;

        let next = user.balance + delta;
        if next.is_negative() {
            return Err(LedgerError::InsufficientBalance {
                balance: user.balance,
                requested: -delta,
            });
        }
        user.balance = next;
        Ok(user.clone())
    }

    /// Append a journal entry. Entries are never reordered.
    pub fn journal(&self, tx: Transaction) {
        self.inner.lock().journal.push(tx);
    }

    /// Atomically apply a balance change and append its journal entry.
    ///
    /// The entry is written only if the adjustment succeeds.
    pub fn adjust_and_journal(&self, user_id: &str, delta: Cash, tx: Transaction) -> Result<User> {
        let mut inner = self.inner.lock();
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::UnknownUser(user_id.to_string()))?;

        let next = user.balance + delta;
        if next.is_negative() {
            return Err(LedgerError::InsufficientBalance {
                balance: user.balance,
                requested: -delta,
            });
        }
        user.balance = next;
        let user = user.clone();
        inner.journal.push(tx);
        Ok(user)
    }

    /// A user's journal entries, newest first, capped at `limit`.
    pub fn history(&self, user_id: &str, limit: usize) -> Vec<Transaction> {
        self.inner
            .lock()
            .journal
            .iter()
            .rev()
            .filter(|tx| tx.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Every journal entry referencing one auction, in insertion order.
    pub fn auction_transactions(&self, auction_id: AuctionId) -> Vec<Transaction> {
        self.inner
            .lock()
            .journal
            .iter()
            .filter(|tx| tx.auction_id == Some(auction_id))
            .cloned()
            .collect()
    }
}
