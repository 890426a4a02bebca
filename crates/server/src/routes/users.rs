//! User endpoints: accounts, balances, deposits, and journal history.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use types::{Cash, Transaction, User, UserId};

use crate::error::AppResult;
use crate::state::ServerState;

/// Account creation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
}

/// Fetch or create an account: `POST /api/users`
pub async fn get_or_create(
    State(state): State<ServerState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(
        state.engine.get_or_create_user(&req.user_id, req.username)?,
    ))
}

/// Fetch an account: `GET /api/users/:id`
pub async fn get(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    Ok(Json(state.engine.get_user(&user_id)?))
}

/// Balance response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: Cash,
}

/// Fetch a balance: `GET /api/users/:id/balance`
pub async fn balance(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<BalanceResponse>> {
    let user = state.engine.get_user(&user_id)?;
    Ok(Json(BalanceResponse {
        user_id: user.user_id,
        balance: user.balance,
    }))
}

/// Deposit request body.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Cash,
}

/// Credit a balance: `POST /api/users/:id/deposit`
pub async fn deposit(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Json(req): Json<DepositRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.engine.deposit(&user_id, req.amount)?))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Journal history, newest first: `GET /api/users/:id/transactions`
pub async fn transactions(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    Ok(Json(state.engine.user_transactions(&user_id, query.limit)?))
}
