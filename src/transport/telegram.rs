//! # transport::telegram
//!
//! **Telegram Bot API** transport: one `sendMessage` call per attempt.
//!
//! ## API Contract
//! ```text
//! POST {api_base}/bot{token}/sendMessage
//! { "chat_id": "...", "text": "...", "parse_mode": "HTML" }
//! ```
//! * 2xx → delivered
//! * 429 → throttled; wait from the `Retry-After` header or the
//!   `parameters.retry_after` body field
//! * anything else → generic failure

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::TransportError;
use crate::transport::Transport;

/// Used when a 429 carries no usable hint.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Numeric id or `@channel` handle.
    pub chat_id:   String,
    pub api_base:  String,
    /// Per-attempt timeout.
    pub timeout:   Duration,
}

// ─── Request / Response ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id:    &'a str,
    text:       &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Error body, e.g. `{"ok":false,"error_code":429,"parameters":{"retry_after":7}}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

fn retry_after_from_body(body: &str) -> Option<u64> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()?
        .parameters?
        .retry_after
}

// ─── Transport ────────────────────────────────────────────────────────────────

pub struct TelegramTransport {
    client: reqwest::Client,
    config: TelegramConfig,
    url:    String,
}

impl TelegramTransport {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        let url = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            config.bot_token
        );
        Self { client, config, url }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            chat_id:    &self.config.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        // ── HTTP POST ─────────────────────────────────────────────────────────
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(timeout = ?self.config.timeout, "⏱️ Telegram request timed out");
                    TransportError::Timeout
                } else {
                    // reqwest errors embed the URL, which embeds the token.
                    let e = e.without_url();
                    warn!(error = %e, "🔌 Telegram unreachable");
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(http_status = %status, "Telegram accepted message");
            return Ok(());
        }

        // ── Rate limit ────────────────────────────────────────────────────────
        let header_hint = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let secs = header_hint
                .or_else(|| retry_after_from_body(&body))
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(TransportError::Throttled {
                retry_after: Duration::from_secs(secs),
            });
        }

        error!(http_status = %status, body = %body, "❌ Telegram API error");
        Err(TransportError::Api {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        http::{header, HeaderValue, StatusCode as HttpStatus},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::Value;

    use super::*;

    /// Canned reply for the local Bot API stand-in.
    struct Reply {
        status:      u16,
        retry_after: Option<&'static str>,
        body:        &'static str,
        delay:       Duration,
    }

    fn reply(status: u16, body: &'static str) -> Reply {
        Reply { status, retry_after: None, body, delay: Duration::ZERO }
    }

    /// Serve `/bottest-token/sendMessage` on a loopback port.  Returns the
    /// base url and the JSON bodies received so far.
    async fn serve_bot_api(reply: Reply) -> (String, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let reply = Arc::new(reply);

        let log = received.clone();
        let app = Router::new().route(
            "/bottest-token/sendMessage",
            post(move |Json(payload): Json<Value>| {
                let reply = reply.clone();
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(payload);
                    tokio::time::sleep(reply.delay).await;

                    let status = HttpStatus::from_u16(reply.status).unwrap();
                    let mut response = (status, reply.body).into_response();
                    if let Some(secs) = reply.retry_after {
                        response
                            .headers_mut()
                            .insert(header::RETRY_AFTER, HeaderValue::from_static(secs));
                    }
                    response
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{addr}"), received)
    }

    fn transport_at(api_base: String, timeout: Duration) -> TelegramTransport {
        TelegramTransport::new(
            reqwest::Client::new(),
            TelegramConfig {
                bot_token: "test-token".into(),
                chat_id:   "-10042".into(),
                api_base,
                timeout,
            },
        )
    }

    async fn send_against(reply: Reply) -> Result<(), TransportError> {
        let (base, _) = serve_bot_api(reply).await;
        transport_at(base, Duration::from_secs(5)).send("hello").await
    }

    fn throttle_secs(result: Result<(), TransportError>) -> u64 {
        match result {
            Err(TransportError::Throttled { retry_after }) => retry_after.as_secs(),
            other => panic!("expected Throttled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_posts_message_and_accepts_2xx() {
        let (base, received) = serve_bot_api(reply(200, r#"{"ok":true}"#)).await;
        let transport = transport_at(format!("{base}/"), Duration::from_secs(5));

        assert!(transport.send("<b>TP1</b>").await.is_ok());

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["chat_id"], "-10042");
        assert_eq!(received[0]["text"], "<b>TP1</b>");
        assert_eq!(received[0]["parse_mode"], "HTML");
    }

    #[tokio::test]
    async fn test_429_prefers_retry_after_header() {
        let result = send_against(Reply {
            retry_after: Some("7"),
            ..reply(429, r#"{"ok":false,"error_code":429,"parameters":{"retry_after":9}}"#)
        })
        .await;
        assert_eq!(throttle_secs(result), 7);
    }

    #[tokio::test]
    async fn test_429_falls_back_to_body_hint() {
        let result = send_against(reply(
            429,
            r#"{"ok":false,"error_code":429,"parameters":{"retry_after":9}}"#,
        ))
        .await;
        assert_eq!(throttle_secs(result), 9);
    }

    #[tokio::test]
    async fn test_429_without_hint_uses_default_wait() {
        let result = send_against(reply(429, "")).await;
        assert_eq!(throttle_secs(result), DEFAULT_RETRY_AFTER_SECS);
    }

    #[tokio::test]
    async fn test_non_2xx_is_api_error_with_body() {
        let result = send_against(reply(502, "oops")).await;
        assert!(
            matches!(&result, Err(TransportError::Api { status: 502, body }) if body == "oops"),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_slow_api_times_out() {
        let (base, _) = serve_bot_api(Reply {
            delay: Duration::from_secs(2),
            ..reply(200, r#"{"ok":true}"#)
        })
        .await;
        let result = transport_at(base, Duration::from_millis(100)).send("hello").await;
        assert!(matches!(result, Err(TransportError::Timeout)), "got {result:?}");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_connection_error_without_token() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = transport_at(format!("http://{addr}"), Duration::from_secs(5))
            .send("hello")
            .await;
        match result {
            Err(TransportError::Connection(msg)) => assert!(!msg.contains("test-token")),
            other => panic!("expected Connection, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_after_from_body() {
        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 7","parameters":{"retry_after":7}}"#;
        assert_eq!(retry_after_from_body(body), Some(7));
    }

    #[test]
    fn test_retry_after_missing_or_garbage() {
        assert_eq!(retry_after_from_body(r#"{"ok":false,"error_code":429}"#), None);
        assert_eq!(retry_after_from_body("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_url_is_built_from_base_and_token() {
        let transport = TelegramTransport::new(
            reqwest::Client::new(),
            TelegramConfig {
                bot_token: "123:abc".into(),
                chat_id:   "-10042".into(),
                api_base:  "https://api.telegram.org/".into(),
                timeout:   Duration::from_secs(5),
            },
        );
        assert_eq!(transport.url, "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SendMessageRequest {
            chat_id:    "-10042",
            text:       "<b>hi</b>",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        })
        .unwrap();
        assert_eq!(body["chat_id"], "-10042");
        assert_eq!(body["parse_mode"], "HTML");
    }
}
