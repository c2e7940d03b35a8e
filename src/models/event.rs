//! # models::event
//!
//! Defines [`TradeEvent`], the lifecycle payload that the signal source
//! (TradingView alert) POSTs to `/webhook`.
//!
//! Each event kind carries only the fields it needs.  The payload is parsed and
//! validated once at the HTTP boundary; past that point the core never sees an
//! untyped value.
//!
//! ```json
//! { "event": "TP_HIT", "id": "XAU-1712", "level": "TP1", "price": 2351.4 }
//! ```

use serde::Deserialize;

use crate::models::trade::{Direction, Level};

// ─── TradeEvent ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeEvent {
    /// A new signal fired.
    NewTrade(NewTradeSignal),
    /// Price reached one of the take-profit targets.
    TpHit(TargetHit),
    /// Price reached the stop.
    SlHit(StopHit),
}

impl TradeEvent {
    /// Trade identifier the event refers to.
    pub fn trade_id(&self) -> &str {
        match self {
            TradeEvent::NewTrade(s) => &s.id,
            TradeEvent::TpHit(h)    => &h.id,
            TradeEvent::SlHit(h)    => &h.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TradeEvent::NewTrade(_) => "NEW_TRADE",
            TradeEvent::TpHit(_)    => "TP_HIT",
            TradeEvent::SlHit(_)    => "SL_HIT",
        }
    }

    /// Semantic checks serde cannot express.  Returns a human-readable reason
    /// on failure so the webhook can reject the single event with a 400.
    pub fn validate(&self) -> Result<(), String> {
        if self.trade_id().trim().is_empty() {
            return Err("field `id` must not be empty".into());
        }

        match self {
            TradeEvent::NewTrade(s) => {
                if s.symbol.trim().is_empty() {
                    return Err("field `symbol` must not be empty".into());
                }
                let prices = [
                    ("entry", s.entry),
                    ("stop_loss", s.stop_loss),
                    ("tp1", s.tp1),
                    ("tp2", s.tp2),
                    ("tp3", s.tp3),
                ];
                if let Some((name, _)) = prices.iter().find(|(_, v)| !v.is_finite()) {
                    return Err(format!("field `{name}` must be a finite number"));
                }
            }
            TradeEvent::TpHit(h) => {
                if !h.price.is_finite() {
                    return Err("field `price` must be a finite number".into());
                }
                if matches!(h.rr, Some(r) if !r.is_finite()) {
                    return Err("field `rr` must be a finite number".into());
                }
            }
            TradeEvent::SlHit(h) => {
                if !h.price.is_finite() {
                    return Err("field `price` must be a finite number".into());
                }
            }
        }

        Ok(())
    }
}

// ─── NEW_TRADE ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewTradeSignal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,

    // Optional descriptive fields the Pine script attaches to the alert.
    #[serde(default)]
    pub signal_type: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

// ─── TP_HIT ───────────────────────────────────────────────────────────────────

/// Only take-profit levels are valid on a `TP_HIT` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetLevel {
    Tp1,
    Tp2,
    Tp3,
}

impl From<TargetLevel> for Level {
    fn from(level: TargetLevel) -> Self {
        match level {
            TargetLevel::Tp1 => Level::Tp1,
            TargetLevel::Tp2 => Level::Tp2,
            TargetLevel::Tp3 => Level::Tp3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetHit {
    pub id: String,
    pub level: TargetLevel,
    pub price: f64,
    /// Reward-to-risk ratio reported by the source (used by the
    /// `reported` TP3 profit policy).
    #[serde(default)]
    pub rr: Option<f64>,
}

// ─── SL_HIT ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StopHit {
    pub id: String,
    pub price: f64,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
