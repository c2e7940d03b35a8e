//! # engine::format
//!
//! Notification text (Telegram HTML parse mode).  Pure functions, no state.

use chrono::{DateTime, Utc};

use crate::models::stats::Outcomes;
use crate::models::{Direction, Level, Stats, Trade, Window};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Decimal places by instrument class: metals/crypto 2, JPY crosses 3,
/// everything else 5.
pub fn format_price(price: f64, symbol: &str) -> String {
    let s = symbol.to_ascii_uppercase();
    if s.contains("XAU") || s.contains("XAG") || s.contains("BTC") || s.contains("ETH") {
        format!("{price:.2}")
    } else if s.contains("JPY") {
        format!("{price:.3}")
    } else {
        format!("{price:.5}")
    }
}

/// Minimal escaping for text interpolated into HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn hashtag(symbol: &str) -> String {
    symbol.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn win_rate_badge(win_rate: f64) -> &'static str {
    if win_rate >= 90.0 {
        "🔥🔥"
    } else if win_rate >= 80.0 {
        "🔥"
    } else {
        "✅"
    }
}

// ─── New Trade ────────────────────────────────────────────────────────────────

pub fn new_trade(trade: &Trade, now: DateTime<Utc>) -> String {
    let sym = &trade.symbol;
    let (head, dir) = match trade.direction {
        Direction::Long  => ("🚀", "🟢 LONG / BUY"),
        Direction::Short => ("📉", "🔴 SHORT / SELL"),
    };
    let risk = trade.risk();

    let mut msg = format!(
        "<b>{head} NEW SIGNAL • {symbol}</b>\n{RULE}\n\n<b>{dir}</b>\n",
        symbol = escape_html(sym),
    );
    if let Some(kind) = &trade.signal_type {
        msg.push_str(&format!("⚡ <b>{}</b>\n", escape_html(kind)));
    }

    msg.push_str(&format!(
        "\n<b>📊 ENTRY</b>\n\
         ├ Entry: <code>{entry}</code>\n\
         ├ SL: <code>{sl}</code>\n\
         └ Risk: {risk}\n\n\
         <b>🎯 TARGETS</b>\n\
         1️⃣ <code>{tp1}</code>\n\
         2️⃣ <code>{tp2}</code>\n\
         3️⃣ <code>{tp3}</code> 🏆\n",
        entry = format_price(trade.entry, sym),
        sl    = format_price(trade.stop_loss, sym),
        risk  = format_price(risk, sym),
        tp1   = format_price(trade.tp1, sym),
        tp2   = format_price(trade.tp2, sym),
        tp3   = format_price(trade.tp3, sym),
    ));

    let analysis: Vec<String> = [
        trade.score.map(|s| format!("Score: {s:.0}/100")),
        trade.pattern.as_deref().map(|p| format!("Pattern: {}", escape_html(p))),
        trade.session.as_deref().map(|s| format!("Session: {}", escape_html(s))),
        trade.timeframe.as_deref().map(|t| format!("Timeframe: {}", escape_html(t))),
    ]
    .into_iter()
    .flatten()
    .collect();

    if !analysis.is_empty() {
        msg.push_str("\n<b>🧠 ANALYSIS</b>\n");
        let last = analysis.len() - 1;
        for (i, line) in analysis.iter().enumerate() {
            let branch = if i == last { "└" } else { "├" };
            msg.push_str(&format!("{branch} {line}\n"));
        }
    }

    msg.push_str(&format!(
        "\n<b>📋 TRADE MANAGEMENT</b>\n\
         ├ <i>TP1: Move SL to breakeven</i>\n\
         ├ <i>TP2: Take 50% profit, trail SL</i>\n\
         └ <i>TP3: Close all, bank profits!</i>\n\n\
         <i>{time}</i>\n{RULE}\n#{tag} #{direction}",
        time      = now.format("%Y-%m-%d %H:%M UTC"),
        tag       = hashtag(sym),
        direction = trade.direction.label(),
    ));

    msg
}

// ─── Level Hit ────────────────────────────────────────────────────────────────

pub fn level_hit(trade: &Trade, level: Level, price: f64) -> String {
    let sym   = &trade.symbol;
    let price = format_price(price, sym);
    let tag   = hashtag(sym);

    if level == Level::Sl {
        return format!(
            "<b>❌ SL HIT: {symbol}</b>\n{RULE}\n\n\
             <b>Direction:</b> {direction}\n\
             <b>Price:</b> <code>{price}</code>\n\
             <b>Loss:</b> {r:+.1}R\n\n\
             Controlled loss. Part of trading.\n\n\
             <i>Wait for next signal.</i>\n{RULE}\n#{tag} #SL",
            symbol    = escape_html(sym),
            direction = trade.direction.label(),
            r         = trade.profit_r,
        );
    }

    let (title, action) = match level {
        Level::Tp1 => (
            format!("💰 TP1 HIT: {}", escape_html(sym)),
            "<b>→ MOVE SL TO BREAKEVEN NOW</b>",
        ),
        Level::Tp2 => (
            format!("💰💰 TP2 HIT: {}", escape_html(sym)),
            "→ Take 50% profit\n→ Trail SL to TP1",
        ),
        _ => (
            format!("🚀🔥 TP3 — FULL TARGET: {}", escape_html(sym)),
            "<b>🏆 TRADE CLOSED — FULL TARGET!</b>",
        ),
    };

    format!(
        "<b>{title}</b>\n{RULE}\n\n\
         <b>Level:</b> {level}\n\
         <b>Direction:</b> {direction}\n\
         <b>Price:</b> <code>{price}</code>\n\
         <b>Profit:</b> {r:+.1}R\n\n\
         <b>⚡ ACTION:</b>\n{action}\n{RULE}\n#{tag} #{level}",
        level     = level.label(),
        direction = trade.direction.label(),
        r         = trade.profit_r,
    )
}

// ─── Summaries ────────────────────────────────────────────────────────────────

pub fn summary(window: Window, stats: Option<&Stats>, now: DateTime<Utc>) -> String {
    let (title, empty, tag) = match window {
        Window::Daily  => ("📊 DAILY SUMMARY", "No trades today.", "#Daily"),
        Window::Weekly => ("📊 WEEKLY SUMMARY", "No trades this week.", "#Weekly"),
    };

    let Some(stats) = stats else {
        return format!("<b>{title}</b>\n{RULE}\n{empty}\n{RULE}");
    };

    let Some(o) = stats.outcomes.as_ref() else {
        return format!(
            "<b>{title}</b>\n{RULE}\n\
             Signals: {signals}\n\
             Active: {active}\n\n\
             All trades still running.\n{RULE}",
            signals = stats.total_signals,
            active  = stats.active_trades,
        );
    };

    let mut msg = format!(
        "<b>{title}</b>\n{RULE}\n\
         Signals: {signals}\n\
         Closed: {closed}\n\
         Active: {active}\n\n\
         {badge} Win Rate: {wr:.1}%\n\
         Total R: {total:+.1}R\n\
         Avg R: {avg:+.2}R\n\n\
         TP3: {tp3} 🎯\n\
         TP2: {tp2} 💰\n\
         TP1: {tp1} ✅\n\
         SL: {sl} ❌\n",
        signals = stats.total_signals,
        closed  = stats.closed_trades,
        active  = stats.active_trades,
        badge   = win_rate_badge(o.win_rate),
        wr      = o.win_rate,
        total   = o.total_r,
        avg     = o.avg_r,
        tp3     = o.tp3_count,
        tp2     = o.tp2_count,
        tp1     = o.tp1_count,
        sl      = o.sl_count,
    );

    push_by_symbol(&mut msg, o);

    msg.push_str(&format!("\n{date}\n{RULE}\n{tag} #Signals", date = now.format("%Y-%m-%d")));
    msg
}

fn push_by_symbol(msg: &mut String, outcomes: &Outcomes) {
    let Some(by_symbol) = outcomes.by_symbol.as_ref() else {
        return;
    };
    msg.push_str("\n<b>By Asset:</b>\n");
    for (symbol, s) in by_symbol {
        msg.push_str(&format!(
            "├ {}: {}W/{}L ({:+.1}R)\n",
            escape_html(symbol),
            s.wins,
            s.losses,
            s.total_r
        ));
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::trade::FinalResult;
    use crate::test_support::sample_trade;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 14, 23, 59, 0).unwrap()
    }

    #[test]
    fn test_format_price_by_symbol() {
        assert_eq!(format_price(2350.456, "XAUUSD"), "2350.46");
        assert_eq!(format_price(151.23456, "USDJPY"), "151.235");
        assert_eq!(format_price(1.0712345, "EURUSD"), "1.07123");
        assert_eq!(format_price(67000.0, "btc/usdt"), "67000.00");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b> & c"), "a&lt;b&gt; &amp; c");
    }

    #[test]
    fn test_new_trade_mentions_levels_and_tags() {
        let mut trade = sample_trade("X1", "XAU/USD");
        trade.pattern = Some("Liquidity <grab>".into());
        let text = new_trade(&trade, now());

        assert!(text.contains("NEW SIGNAL • XAU/USD"));
        assert!(text.contains("<code>2350.00</code>"));
        assert!(text.contains("Pattern: Liquidity &lt;grab&gt;"));
        assert!(text.contains("#XAUUSD #LONG"));
        assert!(text.contains("2024-06-14 23:59 UTC"));
    }

    #[test]
    fn test_level_hit_texts() {
        let mut trade = sample_trade("X1", "XAUUSD");
        trade.profit_r = 1.5;
        let tp1 = level_hit(&trade, Level::Tp1, 2357.5);
        assert!(tp1.contains("TP1 HIT: XAUUSD"));
        assert!(tp1.contains("+1.5R"));
        assert!(tp1.contains("BREAKEVEN"));

        trade.profit_r = -1.0;
        trade.final_result = FinalResult::Sl;
        let sl = level_hit(&trade, Level::Sl, 2345.0);
        assert!(sl.contains("SL HIT: XAUUSD"));
        assert!(sl.contains("-1.0R"));
        assert!(sl.ends_with("#XAUUSD #SL"));
    }

    #[test]
    fn test_empty_and_open_summaries() {
        assert!(summary(Window::Daily, None, now()).contains("No trades today."));
        assert!(summary(Window::Weekly, None, now()).contains("No trades this week."));

        let trades = [sample_trade("a", "XAUUSD")];
        let stats = Stats::compute(&trades, false).unwrap();
        let text = summary(Window::Daily, Some(&stats), now());
        assert!(text.contains("Signals: 1"));
        assert!(text.contains("All trades still running."));
    }

    #[test]
    fn test_weekly_summary_lists_assets() {
        let mut win = sample_trade("a", "XAUUSD");
        win.closed = true;
        win.final_result = FinalResult::Tp3;
        win.profit_r = 4.0;
        let mut loss = sample_trade("b", "EURUSD");
        loss.closed = true;
        loss.final_result = FinalResult::Sl;
        loss.profit_r = -1.0;

        let trades = [win, loss];
        let stats = Stats::compute(&trades, true).unwrap();
        let text = summary(Window::Weekly, Some(&stats), now());

        assert!(text.contains("Win Rate: 50.0%"));
        assert!(text.contains("Total R: +3.0R"));
        assert!(text.contains("├ EURUSD: 0W/1L (-1.0R)"));
        assert!(text.contains("├ XAUUSD: 1W/0L (+4.0R)"));
        assert!(text.contains("#Weekly"));
    }
}
