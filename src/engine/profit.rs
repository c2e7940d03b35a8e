//! # engine::profit
//!
//! R-multiple assigned to a trade when a level is applied.
//!
//! Signal sources disagree on how a full TP3 exit is scored: some use a fixed
//! multiple, others report the reward-to-risk ratio with the event.  Both are
//! valid configurations, selected through [`Tp3Profit`].

use serde::Serialize;

use crate::models::Level;

/// A stop-out always costs exactly the risk taken.
pub const STOP_LOSS_R: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum Tp3Profit {
    /// Always score TP3 with this multiple.
    Fixed { r: f64 },
    /// Use the `rr` reported with the TP3 event, `fallback` when absent.
    Reported { fallback: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitPolicy {
    pub tp1_r: f64,
    pub tp2_r: f64,
    pub tp3:   Tp3Profit,
}

impl Default for ProfitPolicy {
    fn default() -> Self {
        Self {
            tp1_r: 1.5,
            tp2_r: 2.5,
            tp3:   Tp3Profit::Fixed { r: 4.0 },
        }
    }
}

impl ProfitPolicy {
    /// R-multiple for `level`.  `reported` is only consulted for TP3 under
    /// [`Tp3Profit::Reported`].
    pub fn r_for(&self, level: Level, reported: Option<f64>) -> f64 {
        match level {
            Level::Tp1 => self.tp1_r,
            Level::Tp2 => self.tp2_r,
            Level::Tp3 => match self.tp3 {
                Tp3Profit::Fixed { r } => r,
                Tp3Profit::Reported { fallback } => reported.unwrap_or(fallback),
            },
            Level::Sl => STOP_LOSS_R,
        }
    }
}
