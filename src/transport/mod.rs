//! # transport
//!
//! The seam between the delivery queue and whatever chat service carries the
//! text.  A transport makes **one** attempt per call; retrying, backoff and
//! backlog handling all live in [`crate::engine::delivery`].

use async_trait::async_trait;
use tracing::info;

use crate::error::TransportError;

pub mod telegram;

pub use telegram::{TelegramConfig, TelegramTransport};

/// Send a text payload to the configured destination.
#[async_trait]
pub trait Transport: Send + Sync {
    /// One delivery attempt.
    ///
    /// `Err(TransportError::Throttled { .. })` carries the wait suggested by
    /// the downstream service; every other error is a generic failure.
    async fn send(&self, text: &str) -> Result<(), TransportError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// ─── LogTransport ─────────────────────────────────────────────────────────────

/// Used when no chat credentials are configured: the relay keeps tracking
/// trades and every message is written to the log instead.
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        info!(chars = text.len(), "📝 [LOG-ONLY] notification\n{text}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
