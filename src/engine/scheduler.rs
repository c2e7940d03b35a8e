//! # engine::scheduler
//!
//! Background jobs, each its own tokio task:
//!
//! | Job     | When                              | Action                         |
//! |---------|-----------------------------------|--------------------------------|
//! | daily   | every day at `daily_at` (UTC)     | daily summary + window reset   |
//! | weekly  | `weekly_day` at `weekly_at` (UTC) | weekly summary + full reset    |
//! | flush   | every `flush_every`               | retry the delivery backlog     |
//!
//! Jobs share nothing but the ledger and backlog locks, so a slow flush never
//! delays a summary.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::delivery::DeliveryQueue;
use crate::engine::orchestrator::Orchestrator;
use crate::models::Window;

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub daily_at:    NaiveTime,
    pub weekly_day:  Weekday,
    pub weekly_at:   NaiveTime,
    pub flush_every: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default();
        Self {
            daily_at:    end_of_day,
            weekly_day:  Weekday::Sun,
            weekly_at:   end_of_day,
            flush_every: Duration::from_secs(300),
        }
    }
}

// ─── Next Fire ────────────────────────────────────────────────────────────────

/// First instant strictly after `now` whose UTC time-of-day is `at`.
pub fn next_daily(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// First instant strictly after `now` falling on `day` at `at` (UTC).
pub fn next_weekly(now: DateTime<Utc>, day: Weekday, at: NaiveTime) -> DateTime<Utc> {
    let ahead = (7 + day.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let date = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(ahead)))
        .unwrap_or_else(|| now.date_naive());
    let candidate = date.and_time(at).and_utc();
    if candidate > now {
        candidate
    } else {
        candidate + chrono::Duration::days(7)
    }
}

/// Reference instant for computing the next fire: never earlier than the
/// last fire, since the wall clock may still read just before the target when
/// the sleep timer wakes.
fn schedule_base(now: DateTime<Utc>, last_fired: Option<DateTime<Utc>>) -> DateTime<Utc> {
    last_fired.map_or(now, |last| now.max(last))
}

async fn sleep_until(when: DateTime<Utc>) {
    let wait = (when - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    tokio::time::sleep(wait).await;
}

// ─── Spawn ────────────────────────────────────────────────────────────────────

/// Start the three jobs.  Handles are returned for shutdown; dropping them
/// leaves the tasks running.
pub fn spawn(
    config:       ScheduleConfig,
    orchestrator: Arc<Orchestrator>,
    queue:        Arc<DeliveryQueue>,
) -> Vec<JoinHandle<()>> {
    info!(
        daily_at    = %config.daily_at,
        weekly_day  = ?config.weekly_day,
        weekly_at   = %config.weekly_at,
        flush_secs  = config.flush_every.as_secs(),
        "⏰ Scheduler started"
    );

    // ── Daily summary ─────────────────────────────────────────────────────────
    let daily = {
        let orchestrator = orchestrator.clone();
        let at = config.daily_at;
        tokio::spawn(async move {
            let mut last = None;
            loop {
                let next = next_daily(schedule_base(Utc::now(), last), at);
                debug!(%next, "Next daily summary");
                sleep_until(next).await;
                orchestrator.run_summary(Window::Daily).await;
                last = Some(next);
            }
        })
    };

    // ── Weekly summary ────────────────────────────────────────────────────────
    let weekly = {
        let (day, at) = (config.weekly_day, config.weekly_at);
        tokio::spawn(async move {
            let mut last = None;
            loop {
                let next = next_weekly(schedule_base(Utc::now(), last), day, at);
                debug!(%next, "Next weekly summary");
                sleep_until(next).await;
                orchestrator.run_summary(Window::Weekly).await;
                last = Some(next);
            }
        })
    };

    // ── Backlog flush ─────────────────────────────────────────────────────────
    let flush = {
        let every = config.flush_every.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately; nothing is queued yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = queue.flush_backlog().await;
                if report.attempted > 0 {
                    info!(
                        attempted = report.attempted,
                        delivered = report.delivered,
                        requeued  = report.requeued,
                        "🔄 Backlog flush finished"
                    );
                }
            }
        })
    };

    vec![daily, weekly, flush]
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_next_daily_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        assert_eq!(next_daily(now, at(23, 59)), Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 0).unwrap());
    }

    #[test]
    fn test_next_daily_rolls_over_when_due() {
        // Exactly at the fire time: the job just ran, so schedule tomorrow.
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 0).unwrap();
        assert_eq!(next_daily(now, at(23, 59)), Utc.with_ymd_and_hms(2024, 6, 13, 23, 59, 0).unwrap());
    }

    #[test]
    fn test_next_weekly_from_midweek() {
        // 2024-06-12 is a Wednesday.
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        assert_eq!(
            next_weekly(now, Weekday::Sun, at(23, 59)),
            Utc.with_ymd_and_hms(2024, 6, 16, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_next_weekly_same_day() {
        let sunday_morning = Utc.with_ymd_and_hms(2024, 6, 16, 8, 0, 0).unwrap();
        assert_eq!(
            next_weekly(sunday_morning, Weekday::Sun, at(23, 59)),
            Utc.with_ymd_and_hms(2024, 6, 16, 23, 59, 0).unwrap()
        );

        let sunday_after = Utc.with_ymd_and_hms(2024, 6, 16, 23, 59, 30).unwrap();
        assert_eq!(
            next_weekly(sunday_after, Weekday::Sun, at(23, 59)),
            Utc.with_ymd_and_hms(2024, 6, 23, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_early_wakeup_does_not_refire_same_slot() {
        // Timer woke for 23:59 but the wall clock still reads a little before it.
        let fired = Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 0).unwrap();
        let clock = fired - chrono::Duration::milliseconds(400);

        assert_eq!(next_daily(clock, at(23, 59)), fired);
        assert_eq!(
            next_daily(schedule_base(clock, Some(fired)), at(23, 59)),
            Utc.with_ymd_and_hms(2024, 6, 13, 23, 59, 0).unwrap()
        );

        // 2024-06-16 is a Sunday.
        let sunday = Utc.with_ymd_and_hms(2024, 6, 16, 23, 59, 0).unwrap();
        let clock = sunday - chrono::Duration::seconds(1);
        assert_eq!(
            next_weekly(schedule_base(clock, Some(sunday)), Weekday::Sun, at(23, 59)),
            Utc.with_ymd_and_hms(2024, 6, 23, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_schedule_base_follows_clock_once_past_last_fire() {
        let fired = Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 0).unwrap();
        let later = fired + chrono::Duration::minutes(5);
        assert_eq!(schedule_base(later, Some(fired)), later);
        assert_eq!(schedule_base(later, None), later);
    }

    #[test]
    fn test_default_schedule() {
        let cfg = ScheduleConfig::default();
        assert_eq!(cfg.daily_at, at(23, 59));
        assert_eq!(cfg.weekly_day, Weekday::Sun);
        assert_eq!(cfg.flush_every, Duration::from_secs(300));
    }
}
