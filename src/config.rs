//! # config
//!
//! Runtime configuration, read once at startup from the environment (after
//! `.env` is loaded).  Every value has a default except the Telegram
//! credentials; without them the relay runs with the log-only transport.
//!
//! Empty variables are treated as unset.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::{NaiveTime, Weekday};

use crate::engine::delivery::DeliveryConfig;
use crate::engine::profit::{ProfitPolicy, Tp3Profit};
use crate::engine::scheduler::ScheduleConfig;
use crate::transport::TelegramConfig;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` → log-only transport.
    pub telegram:  Option<TelegramConfig>,
    pub delivery:  DeliveryConfig,
    pub schedule:  ScheduleConfig,
    pub profit:    ProfitPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // ── Bind address ──────────────────────────────────────────────────────
        let bind_addr = match (var("BIND_ADDR"), var("PORT")) {
            (Some(addr), _) => addr.parse::<SocketAddr>().with_context(|| format!("BIND_ADDR '{addr}' is not a socket address"))?,
            (None, Some(port)) => {
                let port: u16 = port.parse().with_context(|| format!("PORT '{port}' must be a number"))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        // ── Telegram ──────────────────────────────────────────────────────────
        let timeout = Duration::from_secs(parse_or(&var, "DELIVERY_TIMEOUT_SECS", 5u64)?);
        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                bot_token,
                chat_id,
                api_base: var("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout,
            }),
            (None, None) => None,
            (Some(_), None) => bail!("TELEGRAM_BOT_TOKEN is set but TELEGRAM_CHAT_ID is missing"),
            (None, Some(_)) => bail!("TELEGRAM_CHAT_ID is set but TELEGRAM_BOT_TOKEN is missing"),
        };

        // ── Delivery ──────────────────────────────────────────────────────────
        let delivery = DeliveryConfig {
            max_attempts:       parse_or(&var, "DELIVERY_MAX_ATTEMPTS", 3u32)?.max(1),
            retry_delay:        Duration::from_millis(parse_or(&var, "DELIVERY_RETRY_DELAY_MS", 2000u64)?),
            backoff_multiplier: parse_or(&var, "DELIVERY_BACKOFF_MULTIPLIER", 1.0f64)?,
            max_retry_delay:    Duration::from_millis(parse_or(&var, "DELIVERY_MAX_RETRY_DELAY_MS", 30_000u64)?),
            max_throttle_waits: parse_or(&var, "DELIVERY_MAX_THROTTLE_WAITS", 5u32)?,
            max_throttle_wait:  Duration::from_secs(parse_or(&var, "DELIVERY_MAX_THROTTLE_WAIT_SECS", 60u64)?),
        };
        if !delivery.backoff_multiplier.is_finite() || delivery.backoff_multiplier < 1.0 {
            bail!("DELIVERY_BACKOFF_MULTIPLIER must be >= 1.0");
        }

        // ── Schedule ──────────────────────────────────────────────────────────
        let defaults = ScheduleConfig::default();
        let schedule = ScheduleConfig {
            daily_at:    time_or(&var, "DAILY_SUMMARY_AT", defaults.daily_at)?,
            weekly_day:  match var("WEEKLY_SUMMARY_DAY") {
                Some(day) => day
                    .parse::<Weekday>()
                    .map_err(|_| anyhow!("WEEKLY_SUMMARY_DAY '{day}' is not a weekday"))?,
                None => defaults.weekly_day,
            },
            weekly_at:   time_or(&var, "WEEKLY_SUMMARY_AT", defaults.weekly_at)?,
            flush_every: Duration::from_secs(parse_or(&var, "BACKLOG_FLUSH_SECS", 300u64)?.max(1)),
        };

        // ── Profit policy ─────────────────────────────────────────────────────
        let tp3_r = parse_or(&var, "PROFIT_TP3_R", 4.0f64)?;
        let tp3 = match var("PROFIT_TP3_POLICY").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("fixed") => Tp3Profit::Fixed { r: tp3_r },
            Some("reported")     => Tp3Profit::Reported { fallback: tp3_r },
            Some(other)          => bail!("Unknown PROFIT_TP3_POLICY: '{other}'. Use 'fixed' or 'reported'"),
        };
        let profit = ProfitPolicy {
            tp1_r: parse_or(&var, "PROFIT_TP1_R", 1.5f64)?,
            tp2_r: parse_or(&var, "PROFIT_TP2_R", 2.5f64)?,
            tp3,
        };

        Ok(Self { bind_addr, telegram, delivery, schedule, profit })
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// `HH:MM`, UTC.
fn time_or<V>(var: &V, key: &str, default: NaiveTime) -> anyhow::Result<NaiveTime>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
            .with_context(|| format!("{key} must be HH:MM, got '{raw}'")),
        None => Ok(default),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
