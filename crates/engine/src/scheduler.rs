//! Background round scheduler.
//!
//! A single tokio task woken on a fixed cadence. Each tick it asks the
//! store for active auctions, filters those whose current round deadline
//! has elapsed, and closes them through the engine. Failures are logged
//! and retried on the next tick; closure is idempotent because the
//! engine's precondition check rejects already-closed rounds.

use auction_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use store::AuctionStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use types::RoundStatus;

use crate::engine::AuctionEngine;

/// Default wake cadence.
pub const DEFAULT_TICK: Duration = Duration::from_secs(5);

/// The one writer not driven by an external API call.
pub struct RoundScheduler {
    store: Arc<dyn AuctionStore>,
    engine: Arc<AuctionEngine>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl RoundScheduler {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        engine: Arc<AuctionEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            engine,
            clock,
            period: DEFAULT_TICK,
        }
    }

    /// Override the wake cadence.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run the scheduler until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_ms = self.period.as_millis() as u64, "round scheduler running");
            loop {
                ticker.tick().await;
                self.run_once();
            }
        })
    }

    /// One sweep over due rounds; returns how many closed.
    ///
    /// Public so tests (and an admin path) can drive the sweep without
    /// the timer.
    pub fn run_once(&self) -> usize {
        let candidates = match self.store.find_active() {
            Ok(auctions) => auctions,
            Err(e) => {
                warn!(error = %e, "scheduler could not list active auctions");
                return 0;
            }
        };

        let now = self.clock.now();
        let mut closed = 0;
        for auction in candidates {
            let due = auction
                .current_round()
                .map(|r| r.status == RoundStatus::Active && now >= r.end_time)
                .unwrap_or(false);
            if !due {
                continue;
            }

            match self.engine.close_round(auction.id) {
                Ok(_) => closed += 1,
                Err(e) => {
                    // Left for the next tick.
                    warn!(auction = %auction.id, error = %e, "round close failed");
                }
            }
        }
        closed
    }
}
