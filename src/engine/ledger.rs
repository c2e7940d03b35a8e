//! # engine::ledger
//!
//! **Trade Ledger**: owns every [`Trade`], its state transitions, the
//! per-level notification guard, and the rolling statistics windows.
//!
//! ## Storage
//! ```text
//! trades   : Vec<Trade>           arena, append-only, slots never move
//! active   : id → Slot            live trades
//! history  : Vec<Slot>            closed trades, in closing order
//! daily    : Vec<Slot>            rolling windows (statistics only)
//! weekly   : Vec<Slot>
//! notified : {(id, level)}        the one authoritative dedup guard
//! ```
//! Windows hold slots rather than copies, so a trade that closes after it was
//! registered is counted as closed in every window that still references it.
//!
//! ## Locking
//! All of the above sits behind one `tokio::sync::RwLock`.  Every operation is
//! short and never awaits I/O while holding the guard; callers receive clones.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::engine::profit::ProfitPolicy;
use crate::models::{Level, Stats, Trade, Window};
use crate::models::trade::LevelFlags;

/// Position of a trade in the arena.  Stable for the ledger's lifetime, so it
/// keeps pointing at the same trade after its id is re-registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

/// A level transition together with the slot it touched.
#[derive(Debug, Clone)]
pub struct AppliedLevel {
    pub slot:  Slot,
    pub trade: Trade,
}

#[derive(Debug, Default)]
struct LedgerInner {
    trades:   Vec<Trade>,
    active:   HashMap<String, Slot>,
    history:  Vec<Slot>,
    daily:    Vec<Slot>,
    weekly:   Vec<Slot>,
    notified: HashSet<(String, Level)>,
}

impl LedgerInner {
    fn window(&self, window: Window) -> &[Slot] {
        match window {
            Window::Daily  => &self.daily,
            Window::Weekly => &self.weekly,
        }
    }
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

pub struct Ledger {
    inner:  RwLock<LedgerInner>,
    profit: ProfitPolicy,
}

impl Ledger {
    pub fn new(profit: ProfitPolicy) -> Self {
        Self {
            inner: RwLock::new(LedgerInner::default()),
            profit,
        }
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Start tracking `trade`.  An existing trade with the same id is replaced
    /// (last write wins, no merge); the replaced one stays in whichever windows
    /// already reference it.
    pub async fn register_trade(&self, trade: Trade) {
        let mut inner = self.inner.write().await;

        let slot = Slot(inner.trades.len());
        let id   = trade.id.clone();
        info!(
            trade_id  = %id,
            symbol    = %trade.symbol,
            direction = trade.direction.label(),
            "📊 New trade registered"
        );
        inner.trades.push(trade);

        if inner.active.insert(id.clone(), slot).is_some() {
            warn!(trade_id = %id, "♻️ Trade id re-registered, previous trade overwritten");
        }
        inner.daily.push(slot);
        inner.weekly.push(slot);
    }

    // ─── Dedup Guard ──────────────────────────────────────────────────────────

    /// The idempotency gate: `true` exactly once per `(trade_id, level)` until
    /// the next weekly reset.  Check and set happen under one write guard, so
    /// concurrent callers for the same pair get a single `true` between them.
    pub async fn should_notify(&self, level: Level, trade_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let first = inner.notified.insert((trade_id.to_string(), level));
        if !first {
            debug!(trade_id, level = level.label(), "⏭️ Already notified, skipping");
        }
        first
    }

    // ─── Level Transitions ────────────────────────────────────────────────────

    /// Apply a level event to an active trade.
    ///
    /// Returns `None` (no-op) when the id is unknown or the trade is already
    /// closed.  A level that was already applied is left untouched and the
    /// current trade is returned.  TP3/SL close the trade and move it to the
    /// history.  The returned slot is what [`Ledger::mark_notified`] expects.
    pub async fn apply_level_hit(
        &self,
        trade_id: &str,
        level:    Level,
        price:    f64,
        reported_r: Option<f64>,
    ) -> Option<AppliedLevel> {
        let mut inner = self.inner.write().await;

        let Some(&slot) = inner.active.get(trade_id) else {
            warn!(trade_id, level = level.label(), price, "⚠️ Trade not found in active trades");
            return None;
        };

        let profit_r = self.profit.r_for(level, reported_r);
        let trade    = &mut inner.trades[slot.0];

        if trade.level_hit.get(level) {
            debug!(trade_id, level = level.label(), "Level already applied");
            return Some(AppliedLevel { slot, trade: trade.clone() });
        }

        trade.level_hit.set(level);
        trade.profit_r = profit_r;

        let closes = level.closes_trade();
        if closes {
            trade.closed       = true;
            trade.final_result = level.into();
            trade.closed_at    = Some(Utc::now());
        }
        let snapshot = trade.clone();

        if closes {
            inner.active.remove(trade_id);
            inner.history.push(slot);
            info!(trade_id, level = level.label(), price, profit_r, "🔒 Trade closed");
        } else {
            info!(trade_id, level = level.label(), price, profit_r, "✅ Level hit");
        }

        Some(AppliedLevel { slot, trade: snapshot })
    }

    /// Record that the notification for `level` was handed to the delivery
    /// queue.  Targets the trade at `slot`, even if its id has since been
    /// re-registered.
    pub async fn mark_notified(&self, slot: Slot, level: Level) {
        let mut inner = self.inner.write().await;
        if let Some(trade) = inner.trades.get_mut(slot.0) {
            trade.level_notified.set(level);
        }
    }

    // ─── Statistics ───────────────────────────────────────────────────────────

    /// `None` when the window is empty.  The weekly window also carries the
    /// per-symbol breakdown.
    pub async fn compute_stats(&self, window: Window) -> Option<Stats> {
        let inner = self.inner.read().await;
        let trades = inner.window(window).iter().map(|s| &inner.trades[s.0]);
        Stats::compute(trades, window == Window::Weekly)
    }

    /// Clear a window.  The weekly reset also clears **all** notification
    /// state for every trade, including ones still open.
    pub async fn reset_window(&self, window: Window) {
        let mut inner = self.inner.write().await;
        match window {
            Window::Daily => {
                inner.daily.clear();
                info!("🔄 Daily statistics reset");
            }
            Window::Weekly => {
                inner.weekly.clear();
                inner.notified.clear();
                for trade in inner.trades.iter_mut() {
                    trade.level_notified = LevelFlags::default();
                }
                info!("🔄 Weekly statistics and notification guards reset");
            }
        }
    }

    // ─── Snapshots ────────────────────────────────────────────────────────────

    /// Active trades, oldest first.
    pub async fn active_trades(&self) -> Vec<Trade> {
        let inner = self.inner.read().await;
        let mut trades: Vec<Trade> = inner
            .active
            .values()
            .map(|s| inner.trades[s.0].clone())
            .collect();
        trades.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then_with(|| a.id.cmp(&b.id)));
        trades
    }

    /// Closed trades in the order they closed.
    pub async fn trade_history(&self) -> Vec<Trade> {
        let inner = self.inner.read().await;
        inner.history.iter().map(|s| inner.trades[s.0].clone()).collect()
    }

    pub async fn active_count(&self) -> usize {
        self.inner.read().await.active.len()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
