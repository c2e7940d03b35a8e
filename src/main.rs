//! # Signal Relay: Trade Signal Webhook Ledger
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐   POST /webhook      ┌──────────────────────┐
//!  │ TradingView  │ ────────────────────▶│  Orchestrator        │
//!  │ alert        │  NEW_TRADE / TP_HIT  │   ├─ Ledger          │
//!  └──────────────┘  / SL_HIT            │   └─ DeliveryQueue ──┼──▶ Telegram
//!                                        └──────────────────────┘
//!  ┌──────────────┐                               ▲
//!  │  Scheduler   │ daily / weekly summaries ─────┘
//!  │              │ backlog flush every N secs
//!  └──────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable             | Default          | Description                       |
//! |----------------------|------------------|-----------------------------------|
//! | `BIND_ADDR`          | `0.0.0.0:8080`   | Address Axum listens on (`PORT` also honoured) |
//! | `TELEGRAM_BOT_TOKEN` | (none)           | Bot token; unset → log-only       |
//! | `TELEGRAM_CHAT_ID`   | (none)           | Destination chat / channel        |
//! | `RUST_LOG`           | `signal_relay=debug` | Tracing filter                |
//!
//! The delivery, schedule and profit knobs are listed in [`config`].

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod models;
mod routes;
mod state;
mod transport;

#[cfg(test)]
mod test_support;

use config::AppConfig;
use engine::scheduler;
use state::build_state;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional, production can use real env vars) ───────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("signal_relay=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════╗
  ║        SIGNAL RELAY · Trade Webhook Ledger    ║
  ║   Ledger · Dedup · Retry Queue · Summaries    ║
  ╚═══════════════════════════════════════════════╝"#);

    // ── 3. Configuration ──────────────────────────────────────────────────────
    let config = AppConfig::from_env()?;

    // ── 4. Shared state ───────────────────────────────────────────────────────
    let state = build_state(&config)?;

    // ── 5. Background jobs ────────────────────────────────────────────────────
    let _jobs = scheduler::spawn(
        config.schedule.clone(),
        state.orchestrator.clone(),
        state.queue.clone(),
    );

    // ── 6. Router ─────────────────────────────────────────────────────────────
    let app = routes::router(state);

    // ── 7. Bind & Serve ───────────────────────────────────────────────────────
    info!(addr = ?config.bind_addr, "🚀 Signal relay starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
