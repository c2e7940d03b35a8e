//! # engine::orchestrator
//!
//! Ties the ledger to the delivery queue.  Called by the webhook handler for
//! every validated event and by the scheduler for the periodic summaries.
//!
//! ## Level event flow
//! ```text
//! apply_level_hit ──None──▶ UnknownTrade
//!       │
//! should_notify ──false──▶ Duplicate
//!       │
//! format → dispatch (no ledger guard held) → mark_notified → Notified
//! ```
//! The outcome only describes what the ledger did; delivery failures end up
//! in the backlog and never change it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::delivery::{DeliveryQueue, MessageKind};
use crate::engine::format;
use crate::engine::ledger::Ledger;
use crate::models::{Level, Trade, TradeEvent, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventOutcome {
    /// `NEW_TRADE` stored and announced.
    Registered,
    /// Level applied and its notification handed to the queue.
    Notified,
    /// Level notification already sent for this trade.
    Duplicate,
    /// No active trade with this id (never registered, or already closed).
    UnknownTrade,
}

pub struct Orchestrator {
    ledger: Arc<Ledger>,
    queue:  Arc<DeliveryQueue>,
}

impl Orchestrator {
    pub fn new(ledger: Arc<Ledger>, queue: Arc<DeliveryQueue>) -> Self {
        Self { ledger, queue }
    }

    pub async fn handle_event(&self, event: TradeEvent) -> EventOutcome {
        match event {
            TradeEvent::NewTrade(signal) => {
                let trade = Trade::from_signal(signal);
                let text  = format::new_trade(&trade, Utc::now());
                self.ledger.register_trade(trade).await;
                self.queue.dispatch(&text, MessageKind::NewTrade).await;
                EventOutcome::Registered
            }
            TradeEvent::TpHit(hit) => {
                self.handle_level(&hit.id, hit.level.into(), hit.price, hit.rr).await
            }
            TradeEvent::SlHit(hit) => {
                self.handle_level(&hit.id, Level::Sl, hit.price, None).await
            }
        }
    }

    async fn handle_level(
        &self,
        trade_id:   &str,
        level:      Level,
        price:      f64,
        reported_r: Option<f64>,
    ) -> EventOutcome {
        // ── 1. State transition ───────────────────────────────────────────────
        let Some(applied) = self
            .ledger
            .apply_level_hit(trade_id, level, price, reported_r)
            .await
        else {
            return EventOutcome::UnknownTrade;
        };

        // ── 2. Dedup gate ─────────────────────────────────────────────────────
        if !self.ledger.should_notify(level, trade_id).await {
            return EventOutcome::Duplicate;
        }

        // ── 3. Notify ─────────────────────────────────────────────────────────
        let text = format::level_hit(&applied.trade, level, price);
        let delivered = self
            .queue
            .dispatch(&text, MessageKind::for_level(level))
            .await;
        self.ledger.mark_notified(applied.slot, level).await;

        info!(
            trade_id,
            level = level.label(),
            delivered,
            "📨 Level notification dispatched"
        );
        EventOutcome::Notified
    }

    /// Compute, send and reset one statistics window.  The reset happens even
    /// when the summary could not be delivered (it is in the backlog by then).
    pub async fn run_summary(&self, window: Window) {
        info!(window = window.label(), "📊 Running summary");

        let stats = self.ledger.compute_stats(window).await;
        let text  = format::summary(window, stats.as_ref(), Utc::now());

        if !self.queue.dispatch(&text, MessageKind::for_summary(window)).await {
            warn!(window = window.label(), "⚠️ Summary queued for retry");
        }

        self.ledger.reset_window(window).await;
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
