//! End-to-end auction lifecycle scenarios driven by a manual clock.
//!
//! These tests exercise the full engine loop: admission, anti-sniping
//! extension, round closure, carry-forward, and settlement against the
//! ledger.

use std::sync::Arc;

use auction_core::{Clock, ManualClock};
use engine::{AuctionEngine, EngineError, RoundScheduler};
use ledger::Ledger;
use store::{AuctionStore, MemoryStore};
use types::{AuctionParams, AuctionStatus, Cash, TxKind};

struct Harness {
    engine: Arc<AuctionEngine>,
    ledger: Arc<Ledger>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

fn harness_with_balance(initial: f64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(Ledger::new(Cash::from_float(initial)));
    let clock = Arc::new(ManualClock::new(0));
    let engine = Arc::new(AuctionEngine::new(
        Arc::clone(&store) as Arc<dyn AuctionStore>,
        Arc::clone(&ledger),
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    Harness {
        engine,
        ledger,
        store,
        clock,
    }
}

fn harness() -> Harness {
    harness_with_balance(1000.0)
}

fn params(total_items: u32) -> AuctionParams {
    AuctionParams {
        title: "lot".into(),
        description: String::new(),
        total_items,
        items_per_round: Some(total_items),
        winners_per_round: None,
        round_duration_ms: 10_000,
        min_bid: Cash::from_float(1.0),
        anti_sniping_window_ms: 0,
    }
}

fn balance(h: &Harness, user: &str) -> Cash {
    h.ledger.get_user(user).unwrap().balance
}

#[test]
fn simple_single_round_allocation() {
    let h = harness();
    for u in ["u1", "u2", "u3"] {
        h.engine.get_or_create_user(u, None).unwrap();
    }

    let auction = h.engine.create_auction(params(2)).unwrap();
    let auction = h.engine.start_auction(auction.id).unwrap();
    let id = auction.id;

    h.clock.set(1_000);
    h.engine.place_bid(id, "u1", Cash::from_float(5.0)).unwrap();
    h.clock.set(2_000);
    h.engine.place_bid(id, "u2", Cash::from_float(10.0)).unwrap();
    h.clock.set(3_000);
    h.engine.place_bid(id, "u3", Cash::from_float(7.0)).unwrap();

    h.clock.set(10_000);
    let closed = h.engine.close_round(id).unwrap();

    assert_eq!(closed.status, AuctionStatus::Completed);
    let winners = &closed.rounds[0].winners;
    assert_eq!(winners.len(), 2);
    assert_eq!(winners[0].user_id, "u2");
    assert_eq!(winners[0].bid_amount, Cash::from_float(10.0));
    assert_eq!(winners[0].position, 1);
    assert_eq!(winners[1].user_id, "u3");
    assert_eq!(winners[1].bid_amount, Cash::from_float(7.0));
    assert_eq!(winners[1].position, 2);

    // Loser refunded in full, winners keep their price debited
    assert_eq!(balance(&h, "u1"), Cash::from_float(1000.0));
    assert_eq!(balance(&h, "u2"), Cash::from_float(990.0));
    assert_eq!(balance(&h, "u3"), Cash::from_float(993.0));
}

#[test]
fn losing_bid_carries_forward_with_original_timestamp() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();
    h.engine.get_or_create_user("u2", None).unwrap();

    let mut p = params(2);
    p.items_per_round = None;
    p.winners_per_round = Some(vec![1, 1]);
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(1_000);
    h.engine.place_bid(id, "u1", Cash::from_float(5.0)).unwrap();
    h.clock.set(2_000);
    h.engine.place_bid(id, "u2", Cash::from_float(3.0)).unwrap();

    h.clock.set(10_000);
    let after_r1 = h.engine.close_round(id).unwrap();

    assert_eq!(after_r1.rounds[0].winners[0].user_id, "u1");
    assert_eq!(
        after_r1.status,
        AuctionStatus::Active { current_round: 2 }
    );
    // u2's escrow is NOT refunded; the bid rematerializes in round 2
    assert_eq!(balance(&h, "u2"), Cash::from_float(997.0));
    let carried: Vec<_> = after_r1
        .bids
        .iter()
        .filter(|b| b.round_number == 2)
        .collect();
    assert_eq!(carried.len(), 1);
    assert_eq!(carried[0].user_id, "u2");
    assert_eq!(carried[0].amount, Cash::from_float(3.0));
    assert_eq!(carried[0].timestamp, 2_000);
    assert_eq!(after_r1.rounds[1].total_bids, 1);

    // No new bids; round 2 closes on the carried bid alone
    h.clock.set(20_000);
    let done = h.engine.close_round(id).unwrap();

    assert_eq!(done.status, AuctionStatus::Completed);
    assert_eq!(done.rounds[1].winners[0].user_id, "u2");
    assert_eq!(done.rounds[1].winners[0].bid_amount, Cash::from_float(3.0));
    assert_eq!(balance(&h, "u1"), Cash::from_float(995.0));
    assert_eq!(balance(&h, "u2"), Cash::from_float(997.0));
}

#[test]
fn sniping_top_bid_extends_the_round() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();
    h.engine.get_or_create_user("u2", None).unwrap();

    let mut p = params(1);
    p.anti_sniping_window_ms = 5_000;
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(7_000);
    h.engine.place_bid(id, "u1", Cash::from_float(10.0)).unwrap();

    // New leader inside the window pushes the deadline out
    h.clock.set(9_000);
    h.engine.place_bid(id, "u2", Cash::from_float(20.0)).unwrap();

    let snapshot = h.engine.get_auction(id).unwrap();
    assert_eq!(snapshot.rounds[0].end_time, 14_000);

    // The old deadline no longer closes the round
    h.clock.set(10_000);
    assert!(matches!(
        h.engine.close_round(id),
        Err(EngineError::IllegalState(_))
    ));

    h.clock.set(14_000);
    let done = h.engine.close_round(id).unwrap();
    assert_eq!(done.rounds[0].winners[0].user_id, "u2");
    assert_eq!(balance(&h, "u1"), Cash::from_float(1000.0));
    assert_eq!(balance(&h, "u2"), Cash::from_float(980.0));
}

#[test]
fn sniping_non_top_bid_does_not_extend() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();
    h.engine.get_or_create_user("u2", None).unwrap();

    let mut p = params(1);
    p.anti_sniping_window_ms = 5_000;
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    // The leader's own bid inside the window extends once (to 7s + 5s)
    h.clock.set(7_000);
    h.engine.place_bid(id, "u1", Cash::from_float(10.0)).unwrap();
    let snapshot = h.engine.get_auction(id).unwrap();
    assert_eq!(snapshot.rounds[0].end_time, 12_000);

    // A bid below the top does not move the deadline
    h.clock.set(9_000);
    h.engine.place_bid(id, "u2", Cash::from_float(3.0)).unwrap();
    let snapshot = h.engine.get_auction(id).unwrap();
    assert_eq!(snapshot.rounds[0].end_time, 12_000);

    h.clock.set(12_000);
    let done = h.engine.close_round(id).unwrap();
    assert_eq!(done.rounds[0].winners[0].user_id, "u1");
    assert_eq!(balance(&h, "u1"), Cash::from_float(990.0));
    assert_eq!(balance(&h, "u2"), Cash::from_float(1000.0));
}

#[test]
fn extension_never_exceeds_twice_the_duration() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();
    h.engine.get_or_create_user("u2", None).unwrap();

    let mut p = params(1);
    p.anti_sniping_window_ms = 5_000;
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    // Alternate ever-higher top bids near every deadline
    let mut amount = 10.0;
    let mut t = 9_000;
    for i in 0..8 {
        h.clock.set(t);
        let user = if i % 2 == 0 { "u1" } else { "u2" };
        match h.engine.place_bid(id, user, Cash::from_float(amount)) {
            Ok(_) => {}
            Err(EngineError::RoundEnded) => break,
            Err(e) => panic!("unexpected error: {}", e),
        }
        let snapshot = h.engine.get_auction(id).unwrap();
        assert!(snapshot.rounds[0].end_time <= 20_000);
        amount += 5.0;
        t += 2_000;
    }

    // The cap guarantees the round is closable at 2x the duration
    h.clock.set(20_000);
    let done = h.engine.close_round(id).unwrap();
    assert_eq!(done.status, AuctionStatus::Completed);
    let round = &done.rounds[0];
    assert!(round.end_time - round.start_time <= 2 * 10_000);
}

#[test]
fn never_winning_bidder_is_refunded_at_finalization() {
    let h = harness();
    for u in ["u1", "u2", "u3"] {
        h.engine.get_or_create_user(u, None).unwrap();
    }

    let mut p = params(2);
    p.items_per_round = None;
    p.winners_per_round = Some(vec![1, 1]);
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(1_000);
    h.engine.place_bid(id, "u1", Cash::from_float(100.0)).unwrap();
    h.clock.set(2_000);
    h.engine.place_bid(id, "u2", Cash::from_float(5.0)).unwrap();
    h.clock.set(3_000);
    h.engine.place_bid(id, "u3", Cash::from_float(5.0)).unwrap();

    h.clock.set(10_000);
    h.engine.close_round(id).unwrap();
    h.clock.set(20_000);
    let done = h.engine.close_round(id).unwrap();

    assert_eq!(done.status, AuctionStatus::Completed);
    assert_eq!(done.rounds[0].winners[0].user_id, "u1");
    // The amount tie breaks on the earlier original timestamp
    assert_eq!(done.rounds[1].winners[0].user_id, "u2");

    assert_eq!(balance(&h, "u1"), Cash::from_float(900.0));
    assert_eq!(balance(&h, "u2"), Cash::from_float(995.0));
    // u3 never entered any top: escrow fully returned
    assert_eq!(balance(&h, "u3"), Cash::from_float(1000.0));
    let refunds: Vec<_> = h
        .ledger
        .history("u3", 10)
        .into_iter()
        .filter(|tx| tx.kind == TxKind::Refund)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, Cash::from_float(5.0));
}

#[test]
fn insufficient_balance_leaves_no_trace() {
    let h = harness_with_balance(4.0);
    h.engine.get_or_create_user("u1", None).unwrap();

    let auction = h.engine.create_auction(params(1)).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(1_000);
    let err = h
        .engine
        .place_bid(id, "u1", Cash::from_float(5.0))
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientBalance);

    assert_eq!(balance(&h, "u1"), Cash::from_float(4.0));
    assert!(h.ledger.history("u1", 10).is_empty());
    assert!(h.engine.get_auction(id).unwrap().bids.is_empty());
}

#[test]
fn close_is_rejected_before_the_deadline_and_after_completion() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();

    let auction = h.engine.create_auction(params(1)).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(5_000);
    assert!(matches!(
        h.engine.close_round(id),
        Err(EngineError::IllegalState(_))
    ));

    h.clock.set(10_000);
    h.engine.close_round(id).unwrap();
    let snapshot = h.engine.get_auction(id).unwrap();

    // Second close mutates nothing
    assert!(matches!(
        h.engine.close_round(id),
        Err(EngineError::IllegalState(_))
    ));
    assert_eq!(h.engine.get_auction(id).unwrap(), snapshot);
}

#[test]
fn bid_at_exactly_the_deadline_is_rejected() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();

    let auction = h.engine.create_auction(params(1)).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(10_000);
    assert_eq!(
        h.engine
            .place_bid(id, "u1", Cash::from_float(5.0))
            .unwrap_err(),
        EngineError::RoundEnded
    );
}

#[test]
fn zero_bid_round_closes_empty_and_advances() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();

    let mut p = params(2);
    p.items_per_round = None;
    p.winners_per_round = Some(vec![1, 1]);
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(10_000);
    let after_r1 = h.engine.close_round(id).unwrap();
    assert!(after_r1.rounds[0].winners.is_empty());
    assert_eq!(
        after_r1.status,
        AuctionStatus::Active { current_round: 2 }
    );

    h.clock.set(20_000);
    let done = h.engine.close_round(id).unwrap();
    assert_eq!(done.status, AuctionStatus::Completed);
    assert!(done.rounds[1].winners.is_empty());
}

#[test]
fn admission_preconditions() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();

    let draft = h.engine.create_auction(params(1)).unwrap();

    // Draft auction accepts no bids
    assert!(matches!(
        h.engine.place_bid(draft.id, "u1", Cash::from_float(5.0)),
        Err(EngineError::IllegalState(_))
    ));

    let id = h.engine.start_auction(draft.id).unwrap().id;
    h.clock.set(1_000);

    // Below the minimum
    assert!(matches!(
        h.engine.place_bid(id, "u1", Cash::from_float(0.5)),
        Err(EngineError::BadRequest(_))
    ));

    // Unknown user
    assert!(matches!(
        h.engine.place_bid(id, "ghost", Cash::from_float(5.0)),
        Err(EngineError::NotFound(_))
    ));

    // Starting twice
    assert!(matches!(
        h.engine.start_auction(id),
        Err(EngineError::IllegalState(_))
    ));
}

#[test]
fn items_per_round_normalizes_at_start() {
    let h = harness();
    let mut p = params(10);
    p.items_per_round = Some(3);
    let auction = h.engine.create_auction(p).unwrap();
    assert!(auction.winners_per_round.is_empty());

    let started = h.engine.start_auction(auction.id).unwrap();
    assert_eq!(started.winners_per_round, vec![3, 3, 3, 1]);
    assert_eq!(started.rounds[0].winning_slots, 3);
    assert_eq!(started.status, AuctionStatus::Active { current_round: 1 });
}

#[test]
fn scheduler_sweep_closes_due_rounds_only() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();

    let due = h.engine.create_auction(params(1)).unwrap();
    h.engine.start_auction(due.id).unwrap();
    h.clock.set(1_000);
    h.engine
        .place_bid(due.id, "u1", Cash::from_float(5.0))
        .unwrap();

    h.clock.set(2_000);
    let fresh = h.engine.create_auction(params(1)).unwrap();
    h.engine.start_auction(fresh.id).unwrap();

    let scheduler = RoundScheduler::new(
        Arc::clone(&h.store) as Arc<dyn AuctionStore>,
        Arc::clone(&h.engine),
        Arc::clone(&h.clock) as Arc<dyn Clock>,
    );

    // Nothing due yet
    assert_eq!(scheduler.run_once(), 0);

    // Only the first auction's deadline has elapsed
    h.clock.set(10_000);
    assert_eq!(scheduler.run_once(), 1);
    assert_eq!(
        h.engine.get_auction(due.id).unwrap().status,
        AuctionStatus::Completed
    );
    assert!(matches!(
        h.engine.get_auction(fresh.id).unwrap().status,
        AuctionStatus::Active { .. }
    ));

    // Idempotent: the closed auction is not a candidate anymore
    assert_eq!(scheduler.run_once(), 0);
}

#[test]
fn leaderboard_and_user_bids_projections() {
    let h = harness();
    for u in ["u1", "u2"] {
        h.engine.get_or_create_user(u, None).unwrap();
    }

    let auction = h.engine.create_auction(params(1)).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(1_000);
    h.engine.place_bid(id, "u1", Cash::from_float(5.0)).unwrap();
    h.clock.set(2_000);
    h.engine.place_bid(id, "u2", Cash::from_float(9.0)).unwrap();
    h.clock.set(3_000);
    h.engine.place_bid(id, "u1", Cash::from_float(12.0)).unwrap();

    let board = h.engine.leaderboard(id, 1).unwrap();
    assert_eq!(board.winning_slots, 1);
    assert_eq!(board.entries.len(), 2);
    assert_eq!(board.entries[0].user_id, "u1");
    assert_eq!(board.entries[0].amount, Cash::from_float(12.0));

    let bids = h.engine.user_bids(id, "u1").unwrap();
    assert_eq!(bids.len(), 2);

    assert!(matches!(
        h.engine.leaderboard(id, 9),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn winner_keeps_only_the_winning_debit() {
    let h = harness();
    h.engine.get_or_create_user("u1", None).unwrap();

    let auction = h.engine.create_auction(params(1)).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(1_000);
    h.engine.place_bid(id, "u1", Cash::from_float(5.0)).unwrap();
    h.clock.set(2_000);
    h.engine.place_bid(id, "u1", Cash::from_float(9.0)).unwrap();

    h.clock.set(10_000);
    h.engine.close_round(id).unwrap();

    // The 5.00 underbid comes back at close; the 9.00 price stays paid
    assert_eq!(balance(&h, "u1"), Cash::from_float(991.0));
}

#[test]
fn ledger_conservation_across_a_full_auction() {
    let h = harness();
    for u in ["u1", "u2", "u3"] {
        h.engine.get_or_create_user(u, None).unwrap();
    }
    h.engine.deposit("u1", Cash::from_float(50.0)).unwrap();

    let mut p = params(2);
    p.items_per_round = None;
    p.winners_per_round = Some(vec![1, 1]);
    let auction = h.engine.create_auction(p).unwrap();
    let id = h.engine.start_auction(auction.id).unwrap().id;

    h.clock.set(1_000);
    h.engine.place_bid(id, "u1", Cash::from_float(40.0)).unwrap();
    h.clock.set(2_000);
    h.engine.place_bid(id, "u2", Cash::from_float(30.0)).unwrap();
    h.clock.set(3_000);
    h.engine.place_bid(id, "u3", Cash::from_float(20.0)).unwrap();
    h.clock.set(10_000);
    h.engine.close_round(id).unwrap();
    h.clock.set(20_000);
    let done = h.engine.close_round(id).unwrap();
    assert_eq!(done.status, AuctionStatus::Completed);

    // At completion every escrow debit has been refunded or committed, so
    // each balance is initial + deposits - committed winning bids, and the
    // journal balances out: debits == refunds + wins.
    for user in ["u1", "u2", "u3"] {
        let history = h.ledger.history(user, 100);
        let sum_of = |kind: TxKind| -> Cash {
            history
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| t.amount)
                .sum()
        };
        let deposits = sum_of(TxKind::Deposit);
        let debits = sum_of(TxKind::Bid);
        let refunds = sum_of(TxKind::Refund);
        let committed = sum_of(TxKind::Win);

        assert_eq!(debits, refunds + committed);
        assert_eq!(
            balance(&h, user),
            Cash::from_float(1000.0) + deposits - committed
        );
    }
}
