//! Auction endpoints: lifecycle operations and read-side projections.

use axum::extract::{Path, Query, State};
use axum::Json;
use engine::RoundLeaderboard;
use serde::{Deserialize, Serialize};
use types::{Auction, AuctionParams, Bid, Cash, Timestamp, UserId};

use crate::error::AppResult;
use crate::routes::parse_auction_id;
use crate::state::ServerState;

/// Auction creation request body. Durations arrive in seconds on the
/// wire and are converted to the engine's millisecond parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub total_items: u32,
    #[serde(default)]
    pub items_per_round: Option<u32>,
    #[serde(default)]
    pub winners_per_round: Option<Vec<u32>>,
    /// Round length in seconds (minimum 10).
    pub round_duration: u64,
    pub min_bid: Cash,
    /// Anti-sniping window in seconds (default 10).
    #[serde(default = "default_anti_sniping_secs")]
    pub anti_sniping_window: u64,
}

fn default_anti_sniping_secs() -> u64 {
    10
}

impl From<CreateAuctionRequest> for AuctionParams {
    fn from(req: CreateAuctionRequest) -> Self {
        AuctionParams {
            title: req.title,
            description: req.description,
            total_items: req.total_items,
            items_per_round: req.items_per_round,
            winners_per_round: req.winners_per_round,
            round_duration_ms: req.round_duration * 1_000,
            min_bid: req.min_bid,
            anti_sniping_window_ms: req.anti_sniping_window * 1_000,
        }
    }
}

/// Create a draft auction: `POST /api/auctions`
pub async fn create(
    State(state): State<ServerState>,
    Json(req): Json<CreateAuctionRequest>,
) -> AppResult<Json<Auction>> {
    let auction = state.engine.create_auction(req.into())?;
    state.metrics.auction_created();
    Ok(Json(auction))
}

/// Start a draft auction: `POST /api/auctions/:id/start`
pub async fn start(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Auction>> {
    let id = parse_auction_id(&id)?;
    Ok(Json(state.engine.start_auction(id)?))
}

/// Bid request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    pub user_id: UserId,
    pub amount: Cash,
}

/// Place a bid: `POST /api/auctions/:id/bids`
pub async fn place_bid(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<PlaceBidRequest>,
) -> AppResult<Json<Bid>> {
    let id = parse_auction_id(&id)?;
    match state.engine.place_bid(id, &req.user_id, req.amount) {
        Ok(bid) => {
            state.metrics.bid_placed();
            Ok(Json(bid))
        }
        Err(e) => {
            state.metrics.bid_rejected();
            Err(e.into())
        }
    }
}

/// Close the current round: `POST /api/auctions/:id/close-round`
///
/// Admin path sharing the scheduler's algorithm; rejects rounds whose
/// deadline has not elapsed.
pub async fn close_round(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Auction>> {
    let id = parse_auction_id(&id)?;
    Ok(Json(state.engine.close_round(id)?))
}

/// Fetch one auction: `GET /api/auctions/:id`
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Auction>> {
    let id = parse_auction_id(&id)?;
    Ok(Json(state.engine.get_auction(id)?))
}

/// Active auctions: `GET /api/auctions`
pub async fn active(State(state): State<ServerState>) -> AppResult<Json<Vec<Auction>>> {
    Ok(Json(state.engine.active_auctions()?))
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// All auctions, newest first: `GET /api/auctions/all`
pub async fn all(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Auction>>> {
    Ok(Json(state.engine.all_auctions(query.limit)?))
}

/// One leaderboard row with its winning-slot marker.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub user_id: UserId,
    pub amount: Cash,
    pub timestamp: Timestamp,
    /// Whether this entry currently holds one of the round's slots.
    pub winning: bool,
}

/// Leaderboard response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub round_number: u32,
    pub winning_slots: u32,
    pub entries: Vec<LeaderboardRow>,
}

impl From<RoundLeaderboard> for LeaderboardResponse {
    fn from(board: RoundLeaderboard) -> Self {
        let slots = board.winning_slots as usize;
        Self {
            round_number: board.round_number,
            winning_slots: board.winning_slots,
            entries: board
                .entries
                .into_iter()
                .enumerate()
                .map(|(i, e)| LeaderboardRow {
                    user_id: e.user_id,
                    amount: e.amount,
                    timestamp: e.timestamp,
                    winning: i < slots,
                })
                .collect(),
        }
    }
}

/// Round leaderboard: `GET /api/auctions/:id/rounds/:round/leaderboard`
pub async fn leaderboard(
    State(state): State<ServerState>,
    Path((id, round)): Path<(String, u32)>,
) -> AppResult<Json<LeaderboardResponse>> {
    let id = parse_auction_id(&id)?;
    Ok(Json(state.engine.leaderboard(id, round)?.into()))
}

/// A user's bids on one auction: `GET /api/auctions/:id/users/:user_id/bids`
pub async fn user_bids(
    State(state): State<ServerState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<Bid>>> {
    let id = parse_auction_id(&id)?;
    Ok(Json(state.engine.user_bids(id, &user_id)?))
}
