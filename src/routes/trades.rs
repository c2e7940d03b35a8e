//! # routes::trades
//!
//! Snapshots of the ledger.  Both return clones; nothing here mutates state.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::SharedState;

/// GET /trades/active: open trades, oldest first
pub async fn get_active_trades(State(state): State<SharedState>) -> impl IntoResponse {
    let trades = state.ledger.active_trades().await;
    Json(json!({
        "count":  trades.len(),
        "trades": trades,
    }))
}

/// GET /trades/history: closed trades in closing order
pub async fn get_trade_history(State(state): State<SharedState>) -> impl IntoResponse {
    let trades = state.ledger.trade_history().await;
    Json(json!({
        "count":  trades.len(),
        "trades": trades,
    }))
}
