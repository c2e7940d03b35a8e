//! # routes::webhook
//!
//! **Signal source entry point**: receives trade lifecycle events.
//!
//! The body is parsed here rather than through the `Json` extractor so every
//! malformed payload gets the same `400 {"ok":false,"error":…}` answer.
//! Once an event is valid the response is always `200`: notification
//! delivery is never reported back to the source.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{error::AppError, models::TradeEvent, state::SharedState};

// ─── POST /webhook ────────────────────────────────────────────────────────────

pub async fn handle_webhook(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    debug!(payload = %String::from_utf8_lossy(&body), "📩 Webhook received");

    // ── 1. Parse + validate ───────────────────────────────────────────────────
    let event: TradeEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "❌ Rejected malformed webhook payload");
        AppError::BadRequest(format!("invalid event payload: {e}"))
    })?;

    if let Err(reason) = event.validate() {
        warn!(trade_id = event.trade_id(), reason = %reason, "❌ Rejected invalid event");
        return Err(AppError::BadRequest(reason));
    }

    // ── 2. Orchestrate ────────────────────────────────────────────────────────
    let kind     = event.kind();
    let trade_id = event.trade_id().to_string();
    let outcome  = state.orchestrator.handle_event(event).await;

    info!(event = kind, trade_id = %trade_id, outcome = ?outcome, "Webhook processed");

    Ok((
        StatusCode::OK,
        Json(json!({
            "status":   "success",
            "event":    kind,
            "trade_id": trade_id,
            "outcome":  outcome,
        })),
    ))
}
