//! # routes::health

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::state::SharedState;

/// GET /: liveness plus a few counters
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let active  = state.ledger.active_count().await;
    let backlog = state.queue.backlog_len().await;
    let uptime  = (Utc::now() - state.started_at).num_seconds();

    Json(json!({
        "status":        "online",
        "service":       env!("CARGO_PKG_NAME"),
        "version":       env!("CARGO_PKG_VERSION"),
        "active_trades": active,
        "queued":        backlog,
        "uptime_secs":   uptime,
    }))
}

/// GET /queue: messages waiting for the next backlog flush
pub async fn get_queue(State(state): State<SharedState>) -> impl IntoResponse {
    let pending = state.queue.backlog_snapshot().await;
    Json(json!({
        "count":    pending.len(),
        "messages": pending,
    }))
}
