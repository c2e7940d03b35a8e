//! # state
//!
//! Shared application state, built once in `main` and injected into every
//! Axum handler and scheduler job.
//!
//! ```text
//!              ┌──────────────┐
//!  /webhook ──▶│ Orchestrator │──▶ Ledger         (RwLock: trades, windows, guard)
//!  scheduler ─▶│              │──▶ DeliveryQueue  (Mutex: backlog) ──▶ Transport
//!              └──────────────┘
//! ```
//! No globals: everything is reached through `SharedState`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::engine::delivery::{DeliveryConfig, DeliveryQueue};
use crate::engine::ledger::Ledger;
use crate::engine::orchestrator::Orchestrator;
use crate::engine::profit::ProfitPolicy;
use crate::transport::{LogTransport, TelegramTransport, Transport};

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    pub ledger:       Arc<Ledger>,
    pub queue:        Arc<DeliveryQueue>,
    pub orchestrator: Arc<Orchestrator>,
    pub started_at:   DateTime<Utc>,
}

impl AppState {
    /// Wire the components around an already-built transport.
    pub fn new(transport: Arc<dyn Transport>, delivery: DeliveryConfig, profit: ProfitPolicy) -> Self {
        let ledger = Arc::new(Ledger::new(profit));
        let queue  = Arc::new(DeliveryQueue::new(transport, delivery));
        let orchestrator = Arc::new(Orchestrator::new(ledger.clone(), queue.clone()));
        Self {
            ledger,
            queue,
            orchestrator,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the state from configuration, choosing the transport.
pub fn build_state(config: &AppConfig) -> anyhow::Result<SharedState> {
    let transport: Arc<dyn Transport> = match &config.telegram {
        Some(telegram) => {
            let client = reqwest::Client::builder()
                .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                .build()?;
            info!(chat_id = %telegram.chat_id, "✅ Telegram transport configured");
            Arc::new(TelegramTransport::new(client, telegram.clone()))
        }
        None => {
            warn!("⚠️ TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set, notifications are logged only");
            Arc::new(LogTransport)
        }
    };

    Ok(Arc::new(AppState::new(
        transport,
        config.delivery.clone(),
        config.profit,
    )))
}
