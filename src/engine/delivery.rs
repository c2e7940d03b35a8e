//! # engine::delivery
//!
//! **Notification Delivery Queue**: wraps a [`Transport`] with bounded
//! retry, backoff, rate-limit handling and a failed-message backlog.
//!
//! ## Retry budget
//! ```text
//! send(text)
//!   ├─ Ok                → delivered
//!   ├─ Throttled(wait)   → sleep min(wait, cap), retry   (own budget: max_throttle_waits)
//!   └─ other failure     → sleep backoff(n), retry      (budget: max_attempts)
//! ```
//! Both budgets are finite, so `send` always returns.  A message whose `send`
//! gives up is parked in the backlog and retried by [`DeliveryQueue::flush_backlog`].
//!
//! The backlog has its own lock, independent of the ledger.  A flush swaps
//! the whole list out before doing any network I/O, so messages enqueued
//! while a flush is running simply land in the fresh list.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::models::{Level, Window};
use crate::transport::Transport;

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Generic (non-throttle) attempts per `send`.  At least 1.
    pub max_attempts: u32,
    /// Wait after the first generic failure.
    pub retry_delay: Duration,
    /// `1.0` = fixed delay, `2.0` = doubling.
    pub backoff_multiplier: f64,
    pub max_retry_delay: Duration,
    /// Throttle waits allowed per `send` on top of the generic attempts.
    pub max_throttle_waits: u32,
    /// Upper bound on a single downstream-suggested wait.
    pub max_throttle_wait: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts:       3,
            retry_delay:        Duration::from_secs(2),
            backoff_multiplier: 1.0,
            max_retry_delay:    Duration::from_secs(30),
            max_throttle_waits: 5,
            max_throttle_wait:  Duration::from_secs(60),
        }
    }
}

impl DeliveryConfig {
    /// Delay after the `failures`-th generic failure (1-based).
    pub fn backoff_for(&self, failures: u32) -> Duration {
        let exp    = failures.saturating_sub(1).min(31) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exp);
        let secs   = self.retry_delay.as_secs_f64() * factor;
        let capped = secs.min(self.max_retry_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

// ─── PendingMessage ───────────────────────────────────────────────────────────

/// What produced a notification.  Kept with backlog entries for logs and the
/// `/queue` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    NewTrade,
    Tp1Hit,
    Tp2Hit,
    Tp3Hit,
    SlHit,
    DailySummary,
    WeeklySummary,
}

impl MessageKind {
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::Tp1 => MessageKind::Tp1Hit,
            Level::Tp2 => MessageKind::Tp2Hit,
            Level::Tp3 => MessageKind::Tp3Hit,
            Level::Sl  => MessageKind::SlHit,
        }
    }

    pub fn for_summary(window: Window) -> Self {
        match window {
            Window::Daily  => MessageKind::DailySummary,
            Window::Weekly => MessageKind::WeeklySummary,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingMessage {
    pub id:        Uuid,
    pub text:      String,
    pub kind:      MessageKind,
    /// Number of full `send` cycles that failed for this message.
    pub attempts:  u32,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub requeued:  usize,
}

// ─── DeliveryQueue ────────────────────────────────────────────────────────────

pub struct DeliveryQueue {
    transport: Arc<dyn Transport>,
    config:    DeliveryConfig,
    backlog:   Mutex<Vec<PendingMessage>>,
}

impl DeliveryQueue {
    pub fn new(transport: Arc<dyn Transport>, config: DeliveryConfig) -> Self {
        info!(
            transport    = transport.name(),
            max_attempts = config.max_attempts,
            "✅ Delivery queue initialised with retry logic"
        );
        Self {
            transport,
            config,
            backlog: Mutex::new(Vec::new()),
        }
    }

    /// Deliver `text`, retrying within the configured budgets.  Returns
    /// `false` once both are exhausted; never returns an error.
    pub async fn send(&self, text: &str) -> bool {
        let max_attempts = self.config.max_attempts.max(1);
        let mut failures  = 0u32;
        let mut throttled = 0u32;

        loop {
            match self.transport.send(text).await {
                Ok(()) => {
                    info!(
                        attempt  = failures + 1,
                        max      = max_attempts,
                        throttled,
                        "✅ Message delivered"
                    );
                    return true;
                }

                Err(TransportError::Throttled { retry_after }) => {
                    throttled += 1;
                    if throttled > self.config.max_throttle_waits {
                        error!(throttled, "❌ Still rate limited, giving up on this send");
                        return false;
                    }
                    let wait = retry_after.min(self.config.max_throttle_wait);
                    warn!(wait_secs = wait.as_secs(), throttled, "⚠️ Rate limit hit, waiting before retry");
                    tokio::time::sleep(wait).await;
                }

                Err(e) => {
                    failures += 1;
                    if failures >= max_attempts {
                        error!(error = %e, attempts = failures, "❌ Failed to send message after {max_attempts} attempts");
                        return false;
                    }
                    let delay = self.config.backoff_for(failures);
                    warn!(
                        error    = %e,
                        attempt  = failures,
                        max      = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Park a message that `send` could not deliver.
    pub async fn enqueue(&self, text: impl Into<String>, kind: MessageKind) {
        let message = PendingMessage {
            id:        Uuid::new_v4(),
            text:      text.into(),
            kind,
            attempts:  1,
            queued_at: Utc::now(),
        };
        let mut backlog = self.backlog.lock().await;
        backlog.push(message);
        warn!(kind = ?kind, backlog = backlog.len(), "⚠️ Message failed, added to retry queue");
    }

    /// `send`, falling back to `enqueue`.  Returns whether it was delivered now.
    pub async fn dispatch(&self, text: &str, kind: MessageKind) -> bool {
        if self.send(text).await {
            return true;
        }
        self.enqueue(text, kind).await;
        false
    }

    /// Retry every parked message once.  Entries that fail again go back into
    /// the backlog; nothing is dropped.
    pub async fn flush_backlog(&self) -> FlushReport {
        let pending = {
            let mut backlog = self.backlog.lock().await;
            std::mem::take(&mut *backlog)
        };

        let mut report = FlushReport {
            attempted: pending.len(),
            ..FlushReport::default()
        };
        if pending.is_empty() {
            return report;
        }

        info!(count = pending.len(), "🔄 Retrying failed messages");

        for mut message in pending {
            if self.send(&message.text).await {
                info!(kind = ?message.kind, id = %message.id, "✅ Successfully sent queued message");
                report.delivered += 1;
            } else {
                message.attempts += 1;
                error!(kind = ?message.kind, id = %message.id, attempts = message.attempts, "❌ Failed to send queued message");
                self.backlog.lock().await.push(message);
                report.requeued += 1;
            }
        }

        report
    }

    pub async fn backlog_len(&self) -> usize {
        self.backlog.lock().await.len()
    }

    pub async fn backlog_snapshot(&self) -> Vec<PendingMessage> {
        self.backlog.lock().await.clone()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
