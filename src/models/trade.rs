//! # models::trade
//!
//! Defines [`Trade`], one tracked signal from the moment `NEW_TRADE` arrives
//! until a TP3 or SL event closes it.
//!
//! ## Lifecycle
//! ```text
//! ACTIVE ──TP1──▶ ACTIVE ──TP2──▶ ACTIVE ──TP3──▶ CLOSED
//!    └───────────────────SL──────────────────────▶ CLOSED
//! ```
//! TP1/TP2 are intermediate and may arrive in either order.  CLOSED is
//! terminal: the ledger ignores every level event after it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::NewTradeSignal;

// ─── Direction ────────────────────────────────────────────────────────────────

/// Side of the signal as reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Long  => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

// ─── Level ────────────────────────────────────────────────────────────────────

/// A price level whose hit is tracked (and notified) at most once per trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Tp1,
    Tp2,
    Tp3,
    Sl,
}

impl Level {
    /// TP3 and SL end the trade; TP1/TP2 leave it running.
    #[inline]
    pub fn closes_trade(self) -> bool {
        matches!(self, Level::Tp3 | Level::Sl)
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Tp1 => "TP1",
            Level::Tp2 => "TP2",
            Level::Tp3 => "TP3",
            Level::Sl  => "SL",
        }
    }
}

// ─── FinalResult ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FinalResult {
    Active,
    Tp1,
    Tp2,
    Tp3,
    Sl,
}

impl FinalResult {
    /// Any take-profit outcome counts as a win.
    #[inline]
    pub fn is_win(self) -> bool {
        matches!(self, FinalResult::Tp1 | FinalResult::Tp2 | FinalResult::Tp3)
    }
}

impl From<Level> for FinalResult {
    fn from(level: Level) -> Self {
        match level {
            Level::Tp1 => FinalResult::Tp1,
            Level::Tp2 => FinalResult::Tp2,
            Level::Tp3 => FinalResult::Tp3,
            Level::Sl  => FinalResult::Sl,
        }
    }
}

// ─── LevelFlags ───────────────────────────────────────────────────────────────

/// One boolean per [`Level`].  Used for both `level_hit` and `level_notified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFlags {
    pub tp1: bool,
    pub tp2: bool,
    pub tp3: bool,
    pub sl:  bool,
}

impl LevelFlags {
    #[inline]
    pub fn get(&self, level: Level) -> bool {
        match level {
            Level::Tp1 => self.tp1,
            Level::Tp2 => self.tp2,
            Level::Tp3 => self.tp3,
            Level::Sl  => self.sl,
        }
    }

    #[inline]
    pub fn set(&mut self, level: Level) {
        match level {
            Level::Tp1 => self.tp1 = true,
            Level::Tp2 => self.tp2 = true,
            Level::Tp3 => self.tp3 = true,
            Level::Sl  => self.sl  = true,
        }
    }
}

// ─── Trade ────────────────────────────────────────────────────────────────────

/// A tracked signal.  Owned exclusively by the ledger; everything outside it
/// only ever sees clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Identifier supplied by the event source (never generated here).
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,

    // ── Descriptive fields (message text + API snapshots only) ───────────────
    pub signal_type: Option<String>,
    pub pattern: Option<String>,
    pub score: Option<f64>,
    pub timeframe: Option<String>,
    pub session: Option<String>,

    // ── State ─────────────────────────────────────────────────────────────────
    /// Set the first time a level event is applied to state.
    pub level_hit: LevelFlags,
    /// Set once the notification for a level was handed to the delivery queue.
    pub level_notified: LevelFlags,
    pub final_result: FinalResult,
    pub closed: bool,
    /// R-multiple assigned by the most recently applied level.
    pub profit_r: f64,

    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn from_signal(signal: NewTradeSignal) -> Self {
        Self {
            id: signal.id,
            symbol: signal.symbol,
            direction: signal.direction,
            entry: signal.entry,
            stop_loss: signal.stop_loss,
            tp1: signal.tp1,
            tp2: signal.tp2,
            tp3: signal.tp3,
            signal_type: signal.signal_type,
            pattern: signal.pattern,
            score: signal.score,
            timeframe: signal.timeframe,
            session: signal.session,
            level_hit: LevelFlags::default(),
            level_notified: LevelFlags::default(),
            final_result: FinalResult::Active,
            closed: false,
            profit_r: 0.0,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    /// Distance between entry and stop: the "1R" of this trade.
    #[inline]
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_tp3_and_sl_close() {
        assert!(!Level::Tp1.closes_trade());
        assert!(!Level::Tp2.closes_trade());
        assert!(Level::Tp3.closes_trade());
        assert!(Level::Sl.closes_trade());
    }

    #[test]
    fn test_level_flags_track_each_level_independently() {
        let mut flags = LevelFlags::default();
        flags.set(Level::Tp2);
        assert!(flags.get(Level::Tp2));
        assert!(!flags.get(Level::Tp1));
        assert!(!flags.get(Level::Sl));
    }

    #[test]
    fn test_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Level::Tp3).unwrap(), r#""TP3""#);
        assert_eq!(serde_json::to_string(&FinalResult::Active).unwrap(), r#""ACTIVE""#);
        assert_eq!(serde_json::from_str::<Direction>(r#""SHORT""#).unwrap(), Direction::Short);
    }

    #[test]
    fn test_sl_is_not_a_win() {
        assert!(FinalResult::Tp1.is_win());
        assert!(!FinalResult::Sl.is_win());
        assert!(!FinalResult::Active.is_win());
    }
}
