//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::delivery::DeliveryConfig;
use crate::error::TransportError;
use crate::models::event::NewTradeSignal;
use crate::models::{Direction, Trade};
use crate::transport::Transport;

/// A long gold-style signal: 5.0 risk, targets at 1.5R / 2.5R / 4R.
pub fn sample_signal(id: &str, symbol: &str) -> NewTradeSignal {
    NewTradeSignal {
        id:          id.to_string(),
        symbol:      symbol.to_string(),
        direction:   Direction::Long,
        entry:       2350.0,
        stop_loss:   2345.0,
        tp1:         2357.5,
        tp2:         2362.5,
        tp3:         2370.0,
        signal_type: None,
        pattern:     None,
        score:       None,
        timeframe:   None,
        session:     None,
    }
}

/// An open trade built from [`sample_signal`].
pub fn sample_trade(id: &str, symbol: &str) -> Trade {
    Trade::from_signal(sample_signal(id, symbol))
}

/// Same budgets as the default config, no sleeping.
pub fn fast_delivery() -> DeliveryConfig {
    DeliveryConfig {
        max_attempts:       3,
        retry_delay:        Duration::ZERO,
        backoff_multiplier: 1.0,
        max_retry_delay:    Duration::ZERO,
        max_throttle_waits: 5,
        max_throttle_wait:  Duration::ZERO,
    }
}

// ─── ScriptedTransport ────────────────────────────────────────────────────────

/// Transport double.  Scripted results are consumed first; after that every
/// call fails with a connection error while `down`, otherwise succeeds.
pub struct ScriptedTransport {
    script:    Mutex<VecDeque<Result<(), TransportError>>>,
    down:      AtomicBool,
    calls:     AtomicUsize,
    delivered: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn build(script: Vec<Result<(), TransportError>>, down: bool) -> Arc<Self> {
        Arc::new(Self {
            script:    Mutex::new(script.into()),
            down:      AtomicBool::new(down),
            calls:     AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        })
    }

    pub fn with_script(script: Vec<Result<(), TransportError>>) -> Arc<Self> {
        Self::build(script, false)
    }

    pub fn healthy() -> Arc<Self> {
        Self::build(Vec::new(), false)
    }

    pub fn down() -> Arc<Self> {
        Self::build(Vec::new(), true)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.script.lock().unwrap().pop_front();
        let result = match scripted {
            Some(result) => result,
            None if self.down.load(Ordering::SeqCst) => {
                Err(TransportError::Connection("scripted outage".into()))
            }
            None => Ok(()),
        };

        if result.is_ok() {
            self.delivered.lock().unwrap().push(text.to_string());
        }
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
