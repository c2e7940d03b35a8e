//! # routes::stats
//!
//! | Method | Path            | Description                         |
//! |--------|-----------------|-------------------------------------|
//! | GET    | `/stats/daily`  | Current daily window                |
//! | GET    | `/stats/weekly` | Current weekly window, with by-asset |
//!
//! Read-only: the windows are reset only by the scheduled summaries.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{models::Window, state::SharedState};

async fn window_stats(state: &SharedState, window: Window) -> Json<serde_json::Value> {
    match state.ledger.compute_stats(window).await {
        Some(stats) => Json(json!(stats)),
        None => {
            let message = match window {
                Window::Daily  => "No trades today",
                Window::Weekly => "No trades this week",
            };
            Json(json!({ "message": message }))
        }
    }
}

/// GET /stats/daily
pub async fn get_daily_stats(State(state): State<SharedState>) -> impl IntoResponse {
    window_stats(&state, Window::Daily).await
}

/// GET /stats/weekly
pub async fn get_weekly_stats(State(state): State<SharedState>) -> impl IntoResponse {
    window_stats(&state, Window::Weekly).await
}
