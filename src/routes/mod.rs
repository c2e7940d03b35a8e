//! # routes
//!
//! | Method | Path              | Handler                       |
//! |--------|-------------------|-------------------------------|
//! | GET    | `/`               | [`health::health_check`]      |
//! | POST   | `/webhook`        | [`webhook::handle_webhook`]   |
//! | GET    | `/stats/daily`    | [`stats::get_daily_stats`]    |
//! | GET    | `/stats/weekly`   | [`stats::get_weekly_stats`]   |
//! | GET    | `/trades/active`  | [`trades::get_active_trades`] |
//! | GET    | `/trades/history` | [`trades::get_trade_history`] |
//! | GET    | `/queue`          | [`health::get_queue`]         |

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::SharedState;

pub mod health;
pub mod stats;
pub mod trades;
pub mod webhook;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Ingest ────────────────────────────────────────────────────────────
        .route("/webhook",         post(webhook::handle_webhook))
        // ── Read API ──────────────────────────────────────────────────────────
        .route("/",                get(health::health_check))
        .route("/stats/daily",     get(stats::get_daily_stats))
        .route("/stats/weekly",    get(stats::get_weekly_stats))
        .route("/trades/active",   get(trades::get_active_trades))
        .route("/trades/history",  get(trades::get_trade_history))
        .route("/queue",           get(health::get_queue))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
