//! The per-auction state machine.
//!
//! Every mutating operation on one auction runs inside that auction's
//! critical section: a lock looked up (or created) in a shared map keyed
//! by auction id. Operations on different auctions proceed in parallel;
//! on one auction they are linearized, so admission checks, anti-sniping
//! evaluation, and round closure each observe a settled aggregate.
//!
//! Settlement crosses two aggregates (auction and ledger) and uses a
//! compensating-write discipline: the debit precedes the aggregate
//! mutation, and a failed persist credits the debit back. A failed
//! `place_bid` therefore leaves no bid and no net balance change.

use auction_core::{rank, settle_round, Clock, LeaderboardEntry};
use ledger::Ledger;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use store::AuctionStore;
use tracing::{debug, error, info, warn};
use types::{
    normalize_round_plan, Auction, AuctionId, AuctionParams, AuctionStatus, Bid, BidId, Cash,
    Round, RoundStatus, Timestamp, Transaction, TxKind, User, UserId,
};

use crate::error::{EngineError, Result};

/// Read-side projection of one round's ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundLeaderboard {
    pub round_number: u32,
    /// Number of leading entries that currently hold a winning slot.
    pub winning_slots: u32,
    pub entries: Vec<LeaderboardEntry>,
}

/// The auction engine: state machine plus read-side projections.
pub struct AuctionEngine {
    store: Arc<dyn AuctionStore>,
    ledger: Arc<Ledger>,
    clock: Arc<dyn Clock>,
    /// Per-auction critical sections.
    locks: Mutex<HashMap<AuctionId, Arc<Mutex<()>>>>,
}

impl AuctionEngine {
    pub fn new(store: Arc<dyn AuctionStore>, ledger: Arc<Ledger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ledger,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The lock guarding one auction's mutating operations.
    fn lock_for(&self, id: AuctionId) -> Arc<Mutex<()>> {
        self.locks.lock().entry(id).or_default().clone()
    }

    fn load(&self, id: AuctionId) -> Result<Auction> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| EngineError::NotFound(format!("auction {}", id)))
    }

    // =========================================================================
    // Lifecycle operations
    // =========================================================================

    /// Create a draft auction from validated parameters.
    pub fn create_auction(&self, params: AuctionParams) -> Result<Auction> {
        params.validate()?;
        let now = self.clock.now();

        let auction = Auction {
            id: AuctionId::new(),
            title: params.title,
            description: params.description,
            total_items: params.total_items,
            winners_per_round: params.winners_per_round.unwrap_or_default(),
            items_per_round: params.items_per_round,
            round_duration_ms: params.round_duration_ms,
            min_bid: params.min_bid,
            anti_sniping_window_ms: params.anti_sniping_window_ms,
            status: AuctionStatus::Draft,
            rounds: Vec::new(),
            bids: Vec::new(),
            created_at: now,
            started_at: None,
            completed_at: None,
        };

        self.store.save(&auction)?;
        info!(auction = %auction.id, title = %auction.title, "auction created");
        Ok(auction)
    }

    /// Start a draft auction: resolve the round plan and open round 1.
    pub fn start_auction(&self, id: AuctionId) -> Result<Auction> {
        let lock = self.lock_for(id);
        let _guard = lock.lock();

        let now = self.clock.now();
        let mut auction = self.load(id)?;

        if auction.status != AuctionStatus::Draft {
            return Err(EngineError::IllegalState(
                "only a draft auction can be started".into(),
            ));
        }

        if auction.winners_per_round.is_empty() {
            let per_round = auction.items_per_round.ok_or_else(|| {
                EngineError::BadRequest("auction has no round plan".into())
            })?;
            auction.winners_per_round = normalize_round_plan(auction.total_items, per_round);
        }
        let planned: u32 = auction.winners_per_round.iter().sum();
        if planned != auction.total_items {
            return Err(EngineError::BadRequest(format!(
                "round plan awards {} items but the auction holds {}",
                planned, auction.total_items
            )));
        }

        auction.rounds.push(Round::open(
            1,
            auction.winners_per_round[0],
            now,
            auction.round_duration_ms,
        ));
        auction.status = AuctionStatus::Active { current_round: 1 };
        auction.started_at = Some(now);

        self.store.save(&auction)?;
        info!(auction = %auction.id, rounds = auction.winners_per_round.len(), "auction started");
        Ok(auction)
    }

    /// Admit a bid: debit first, then record, then evaluate anti-sniping.
    pub fn place_bid(&self, id: AuctionId, user_id: &str, amount: Cash) -> Result<Bid> {
        let lock = self.lock_for(id);
        let _guard = lock.lock();

        let now = self.clock.now();
        let mut auction = self.load(id)?;

        let round_number = auction.current_round_number().ok_or_else(|| {
            EngineError::IllegalState("auction is not accepting bids".into())
        })?;
        let (end_time, start_time, winning_slots) = {
            let round = auction
                .round(round_number)
                .ok_or_else(|| EngineError::Internal("active round missing".into()))?;
            if round.status != RoundStatus::Active {
                return Err(EngineError::IllegalState("round is not active".into()));
            }
            (round.end_time, round.start_time, round.winning_slots)
        };
        // Strict cutoff: a bid at exactly the deadline is rejected.
        if now >= end_time {
            return Err(EngineError::RoundEnded);
        }
        if amount < auction.min_bid {
            return Err(EngineError::BadRequest(format!(
                "bid {} is below the minimum {}",
                amount, auction.min_bid
            )));
        }
        if self.ledger.get_user(user_id).is_none() {
            return Err(EngineError::NotFound(format!("user {}", user_id)));
        }

        let bid = Bid {
            id: BidId::new(),
            user_id: user_id.to_string(),
            amount,
            timestamp: now,
            round_number,
        };

        // Debit precedes aggregate mutation: if it fails, nothing is recorded.
        let escrow_tx = Transaction::new(
            user_id,
            TxKind::Bid,
            amount,
            format!("bid on \"{}\", round {}", auction.title, round_number),
            now,
        )
        .for_auction(id, round_number)
        .for_bid(bid.id);
        self.ledger.adjust_and_journal(user_id, -amount, escrow_tx)?;

        auction.bids.push(bid.clone());
        if let Some(round) = auction.current_round_mut() {
            round.total_bids += 1;
        }

        // Anti-sniping: a late bid that lands in the top K pushes the
        // deadline forward, capped at twice the nominal duration.
        let window = auction.anti_sniping_window_ms;
        if window > 0 && end_time - now <= window {
            let board = rank(&auction.bids_for_round(round_number));
            let in_top = board
                .iter()
                .position(|e| e.user_id == user_id)
                .map(|p| (p as u32) < winning_slots)
                .unwrap_or(false);
            if in_top {
                let cap = start_time + 2 * auction.round_duration_ms;
                let extended = (now + window).min(cap);
                if extended > end_time {
                    if let Some(round) = auction.current_round_mut() {
                        round.end_time = extended;
                    }
                    debug!(
                        auction = %id,
                        round = round_number,
                        end_time = extended,
                        "anti-sniping extension"
                    );
                }
            }
        }

        if let Err(e) = self.store.save(&auction) {
            // Compensate the debit so the failed admission leaves no trace
            // beyond the journal's escrow-and-reversal pair.
            let reversal = Transaction::new(
                user_id,
                TxKind::Refund,
                amount,
                "bid reversed: aggregate persist failed",
                now,
            )
            .for_auction(id, round_number)
            .for_bid(bid.id);
            if let Err(credit_err) = self.ledger.adjust_and_journal(user_id, amount, reversal) {
                error!(auction = %id, user = user_id, error = %credit_err,
                       "failed to compensate debit after persist failure");
            }
            error!(auction = %id, error = %e, "persist failed, bid rejected");
            return Err(EngineError::Internal(e.to_string()));
        }

        Ok(bid)
    }

    /// Close the current round: settle, then advance or finalize.
    ///
    /// Idempotent in effect: a second call finds no active round past its
    /// deadline and rejects without mutating.
    pub fn close_round(&self, id: AuctionId) -> Result<Auction> {
        let lock = self.lock_for(id);
        let _guard = lock.lock();

        let now = self.clock.now();
        let mut auction = self.load(id)?;

        let round_number = auction.current_round_number().ok_or_else(|| {
            EngineError::IllegalState("auction is not active".into())
        })?;
        let winning_slots = {
            let round = auction
                .round(round_number)
                .ok_or_else(|| EngineError::Internal("active round missing".into()))?;
            if round.status != RoundStatus::Active {
                return Err(EngineError::IllegalState("round is not active".into()));
            }
            if now < round.end_time {
                return Err(EngineError::IllegalState("round has not ended".into()));
            }
            round.winning_slots
        };

        let plan = settle_round(&auction.bids_for_round(round_number), winning_slots);

        if let Some(round) = auction.current_round_mut() {
            round.winners = plan.winners.clone();
            round.status = RoundStatus::Completed;
        }

        for winner in &plan.winners {
            self.ledger.journal(
                Transaction::new(
                    &winner.user_id,
                    TxKind::Win,
                    winner.bid_amount,
                    format!(
                        "won round {} of \"{}\" at position {}",
                        round_number, auction.title, winner.position
                    ),
                    now,
                )
                .for_auction(id, round_number),
            );
        }

        // Winners get their outbid lower bids back; the winning bid stays
        // debited as the price paid.
        for refund in &plan.winner_refunds {
            let tx = Transaction::new(
                &refund.user_id,
                TxKind::Refund,
                refund.amount,
                format!("outbid by own higher bid in round {}", round_number),
                now,
            )
            .for_auction(id, round_number)
            .for_bid(refund.bid_id);
            self.ledger
                .adjust_and_journal(&refund.user_id, refund.amount, tx)?;
        }

        let produced = auction.items_awarded();
        let more_rounds_planned = (round_number as usize) < auction.winners_per_round.len();
        if produced < auction.total_items && more_rounds_planned {
            let next_number = round_number + 1;
            let slots = auction.winners_per_round[round_number as usize];
            let mut next = Round::open(next_number, slots, now, auction.round_duration_ms);
            next.total_bids = plan.carry_forward.len() as u64;
            auction.rounds.push(next);
            auction.status = AuctionStatus::Active {
                current_round: next_number,
            };

            // Losing bids persist into the new round: same user and amount,
            // original timestamp, fresh record.
            for carry in &plan.carry_forward {
                auction.bids.push(Bid {
                    id: BidId::new(),
                    user_id: carry.user_id.clone(),
                    amount: carry.amount,
                    timestamp: carry.timestamp,
                    round_number: next_number,
                });
            }

            info!(
                auction = %id,
                closed = round_number,
                winners = plan.winners.len(),
                carried = plan.carry_forward.len(),
                "round closed, next round opened"
            );
        } else {
            self.finalize(&mut auction, now)?;
            info!(
                auction = %id,
                closed = round_number,
                awarded = auction.items_awarded(),
                "final round closed, auction completed"
            );
        }

        self.store.save(&auction)?;
        Ok(auction)
    }

    /// Complete the auction and return every outstanding escrow debit.
    ///
    /// Outstanding escrow is derived from the journal: bid debits minus
    /// refunds minus committed winning amounts. Users who never won get
    /// everything back; a winner's uncommitted later bids come back too.
    fn finalize(&self, auction: &mut Auction, now: Timestamp) -> Result<()> {
        auction.status = AuctionStatus::Completed;
        auction.completed_at = Some(now);

        let mut outstanding: HashMap<UserId, Cash> = HashMap::new();
        for tx in self.ledger.auction_transactions(auction.id) {
            let entry = outstanding.entry(tx.user_id.clone()).or_default();
            match tx.kind {
                TxKind::Bid => *entry += tx.amount,
                TxKind::Refund | TxKind::Win => *entry -= tx.amount,
                TxKind::Deposit => {}
            }
        }

        let mut owed: Vec<(UserId, Cash)> = outstanding
            .into_iter()
            .filter(|(_, amount)| amount.is_positive())
            .collect();
        owed.sort_by(|a, b| a.0.cmp(&b.0));

        for (user_id, amount) in owed {
            let tx = Transaction::new(
                &user_id,
                TxKind::Refund,
                amount,
                format!("escrow returned: \"{}\" completed", auction.title),
                now,
            )
            .for_auction(auction.id, auction.rounds.len() as u32);
            self.ledger.adjust_and_journal(&user_id, amount, tx)?;
        }
        Ok(())
    }

    // =========================================================================
    // Read-side projections
    // =========================================================================

    /// Fetch one auction snapshot.
    pub fn get_auction(&self, id: AuctionId) -> Result<Auction> {
        self.load(id)
    }

    /// Active auctions with a live round.
    ///
    /// Self-healing projection: an active auction whose rounds are all
    /// closed (a crash between settle and advance, or a stale snapshot
    /// from an older writer) is finalized on sight instead of returned.
    pub fn active_auctions(&self) -> Result<Vec<Auction>> {
        let mut live = Vec::new();
        for candidate in self.store.find_active()? {
            let round_open = candidate
                .current_round()
                .map(|r| r.status == RoundStatus::Active)
                .unwrap_or(false);
            if round_open {
                live.push(candidate);
                continue;
            }

            let lock = self.lock_for(candidate.id);
            let _guard = lock.lock();
            let mut fresh = match self.load(candidate.id) {
                Ok(a) => a,
                Err(_) => continue,
            };
            if !matches!(fresh.status, AuctionStatus::Active { .. }) {
                continue;
            }
            if fresh
                .current_round()
                .map(|r| r.status == RoundStatus::Active)
                .unwrap_or(false)
            {
                // Lost a race with a writer that just opened a round.
                live.push(fresh);
                continue;
            }

            let now = self.clock.now();
            warn!(auction = %fresh.id, "healing stale active auction");
            self.finalize(&mut fresh, now)?;
            self.store.save(&fresh)?;
        }
        Ok(live)
    }

    /// Up to `limit` auctions, newest first.
    pub fn all_auctions(&self, limit: usize) -> Result<Vec<Auction>> {
        Ok(self.store.find_all(limit)?)
    }

    /// Ranked leaderboard for one round.
    pub fn leaderboard(&self, id: AuctionId, round_number: u32) -> Result<RoundLeaderboard> {
        let auction = self.load(id)?;
        let round = auction.round(round_number).ok_or_else(|| {
            EngineError::NotFound(format!("round {} of auction {}", round_number, id))
        })?;

        Ok(RoundLeaderboard {
            round_number,
            winning_slots: round.winning_slots,
            entries: rank(&auction.bids_for_round(round_number)),
        })
    }

    /// Raw bid records for one user, carried copies included.
    pub fn user_bids(&self, id: AuctionId, user_id: &str) -> Result<Vec<Bid>> {
        Ok(self.load(id)?.bids_for_user(user_id))
    }

    // =========================================================================
    // User operations (delegated to the ledger with the engine's clock)
    // =========================================================================

    /// Look up a user account.
    pub fn get_user(&self, user_id: &str) -> Result<User> {
        self.ledger
            .get_user(user_id)
            .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))
    }

    /// Fetch or create a user account with the seed balance.
    pub fn get_or_create_user(&self, user_id: &str, username: Option<String>) -> Result<User> {
        if user_id.trim().is_empty() {
            return Err(EngineError::BadRequest("userId must not be empty".into()));
        }
        Ok(self.ledger.get_or_create(user_id, username))
    }

    /// Credit a user's balance from outside the auction flow.
    pub fn deposit(&self, user_id: &str, amount: Cash) -> Result<User> {
        if !amount.is_positive() {
            return Err(EngineError::BadRequest(
                "deposit amount must be positive".into(),
            ));
        }
        let now = self.clock.now();
        let tx = Transaction::new(user_id, TxKind::Deposit, amount, "balance deposit", now);
        Ok(self.ledger.adjust_and_journal(user_id, amount, tx)?)
    }

    /// A user's journal entries, newest first.
    pub fn user_transactions(&self, user_id: &str, limit: usize) -> Result<Vec<Transaction>> {
        if self.ledger.get_user(user_id).is_none() {
            return Err(EngineError::NotFound(format!("user {}", user_id)));
        }
        Ok(self.ledger.history(user_id, limit))
    }
}
