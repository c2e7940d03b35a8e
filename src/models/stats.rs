//! # models::stats
//!
//! Win/loss aggregation over a rolling window of trades.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::trade::{FinalResult, Trade};

// ─── Window ───────────────────────────────────────────────────────────────────

/// The two rolling windows the ledger keeps purely for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Daily,
    Weekly,
}

impl Window {
    pub fn label(self) -> &'static str {
        match self {
            Window::Daily  => "daily",
            Window::Weekly => "weekly",
        }
    }
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// Statistics for one window.
///
/// `outcomes` is `None` while nothing in the window has closed yet; the JSON
/// body then only carries the signal/active counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_signals: usize,
    pub closed_trades: usize,
    pub active_trades: usize,
    #[serde(flatten)]
    pub outcomes: Option<Outcomes>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcomes {
    pub tp3_count: usize,
    pub tp2_count: usize,
    pub tp1_count: usize,
    pub sl_count: usize,
    pub wins: usize,
    pub losses: usize,
    /// `wins / closed × 100`
    pub win_rate: f64,
    pub total_r: f64,
    pub avg_r: f64,
    /// Weekly window only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_symbol: Option<BTreeMap<String, SymbolStats>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymbolStats {
    pub wins: usize,
    pub losses: usize,
    pub total_r: f64,
}

impl Stats {
    /// Aggregate `trades`.  Returns `None` for an empty window.
    pub fn compute<'a, I>(trades: I, by_symbol: bool) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Trade>,
    {
        let trades: Vec<&Trade> = trades.into_iter().collect();
        if trades.is_empty() {
            return None;
        }

        let total  = trades.len();
        let closed: Vec<&Trade> = trades.iter().copied().filter(|t| t.closed).collect();

        if closed.is_empty() {
            return Some(Self {
                total_signals: total,
                closed_trades: 0,
                active_trades: total,
                outcomes:      None,
            });
        }

        let count = |result: FinalResult| closed.iter().filter(|t| t.final_result == result).count();
        let tp3 = count(FinalResult::Tp3);
        let tp2 = count(FinalResult::Tp2);
        let tp1 = count(FinalResult::Tp1);
        let sl  = count(FinalResult::Sl);

        let wins    = tp1 + tp2 + tp3;
        let total_r: f64 = closed.iter().map(|t| t.profit_r).sum();
        let n       = closed.len() as f64;

        let by_symbol = by_symbol.then(|| {
            let mut map: BTreeMap<String, SymbolStats> = BTreeMap::new();
            for t in &closed {
                let entry = map.entry(t.symbol.clone()).or_default();
                if t.final_result.is_win() {
                    entry.wins += 1;
                } else {
                    entry.losses += 1;
                }
                entry.total_r += t.profit_r;
            }
            map
        });

        Some(Self {
            total_signals: total,
            closed_trades: closed.len(),
            active_trades: total - closed.len(),
            outcomes: Some(Outcomes {
                tp3_count: tp3,
                tp2_count: tp2,
                tp1_count: tp1,
                sl_count:  sl,
                wins,
                losses: sl,
                win_rate: wins as f64 / n * 100.0,
                total_r,
                avg_r: total_r / n,
                by_symbol,
            }),
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_trade;

    fn closed(id: &str, symbol: &str, result: FinalResult, r: f64) -> Trade {
        let mut t = sample_trade(id, symbol);
        t.closed = true;
        t.final_result = result;
        t.profit_r = r;
        t
    }

    #[test]
    fn test_empty_window_is_none() {
        assert_eq!(Stats::compute(Vec::<&Trade>::new(), false), None);
    }

    #[test]
    fn test_open_only_window_has_no_outcomes() {
        let trades = [sample_trade("a", "XAUUSD"), sample_trade("b", "EURUSD")];
        let stats = Stats::compute(&trades, false).unwrap();
        assert_eq!(stats.total_signals, 2);
        assert_eq!(stats.closed_trades, 0);
        assert_eq!(stats.active_trades, 2);
        assert!(stats.outcomes.is_none());

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("win_rate").is_none());
    }

    #[test]
    fn test_two_tp3_one_sl() {
        let trades = [
            closed("a", "XAUUSD", FinalResult::Tp3, 4.0),
            closed("b", "XAUUSD", FinalResult::Tp3, 4.0),
            closed("c", "EURUSD", FinalResult::Sl, -1.0),
            sample_trade("d", "EURUSD"),
        ];
        let stats = Stats::compute(&trades, false).unwrap();
        let o = stats.outcomes.unwrap();

        assert_eq!(stats.closed_trades, 3);
        assert_eq!(stats.active_trades, 1);
        assert_eq!(o.wins, 2);
        assert_eq!(o.losses, 1);
        assert_eq!(format!("{:.1}", o.win_rate), "66.7");
        assert!((o.total_r - 7.0).abs() < 1e-9);
        assert!((o.avg_r - 7.0 / 3.0).abs() < 1e-9);
        assert!(o.by_symbol.is_none());
    }

    #[test]
    fn test_weekly_breaks_down_by_symbol() {
        let trades = [
            closed("a", "XAUUSD", FinalResult::Tp3, 4.0),
            closed("b", "XAUUSD", FinalResult::Sl, -1.0),
            closed("c", "BTCUSD", FinalResult::Tp3, 4.0),
        ];
        let stats = Stats::compute(&trades, true).unwrap();
        let by_symbol = stats.outcomes.unwrap().by_symbol.unwrap();

        assert_eq!(by_symbol["XAUUSD"], SymbolStats { wins: 1, losses: 1, total_r: 3.0 });
        assert_eq!(by_symbol["BTCUSD"], SymbolStats { wins: 1, losses: 0, total_r: 4.0 });
    }

    #[test]
    fn test_flattened_json_shape() {
        let trades = [closed("a", "XAUUSD", FinalResult::Sl, -1.0)];
        let json = serde_json::to_value(Stats::compute(&trades, false).unwrap()).unwrap();
        assert_eq!(json["sl_count"], 1);
        assert_eq!(json["win_rate"], 0.0);
        assert!(json.get("by_symbol").is_none());
    }
}
