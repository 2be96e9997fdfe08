//! ==============================================================================
//! render.rs - dashboard html and terminal text
//! ==============================================================================
//!
//! purpose:
//!     pure formatting of readings. no io here so both presenters share it
//!     and it can be tested without a server or a terminal.
//!
//!     - render_dashboard: full html page for the web dashboard
//!     - latest_lines / history_lines: plain text for the watch view
//!
//! ==============================================================================

use crate::domain::{recent, DashboardState, Reading, Vital};

/// shown when the latest fetch produced nothing
pub const FETCH_FAILED: &str = "Failed to fetch data from Firebase.";
/// shown when the history is empty
pub const NO_HISTORY: &str = "No historical data available.";

pub const TITLE: &str = "Real-Time Health Monitor";

/// page-level settings that are not part of the readings
pub struct PageOptions<'a> {
    pub share_url: &'a str,
    pub refresh_seconds: u64,
    pub history_limit: usize,
}

/// card background per vital
fn card_color(vital: Vital) -> &'static str {
    match vital {
        Vital::HeartRate => "#C8E6C9",
        Vital::Oxygen => "#BBDEFB",
        Vital::Temperature => "#FFF9C4",
    }
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_dashboard(state: &DashboardState, opts: &PageOptions<'_>) -> String {
    let mut cards = String::new();
    for vital in Vital::ALL {
        let value = match &state.latest {
            Some(reading) => reading.display(vital),
            None => crate::domain::PLACEHOLDER.to_string(),
        };
        cards.push_str(&format!(
            r#"<div class="card" style="background: {};"><h2>{}</h2><p class="value">{}</p></div>"#,
            card_color(vital),
            html_escape(vital.label()),
            html_escape(&value),
        ));
    }

    let banner = if state.latest.is_none() {
        format!(r#"<div class="error">{}</div>"#, FETCH_FAILED)
    } else {
        String::new()
    };

    let history = history_lines(&state.history, opts.history_limit)
        .iter()
        .map(|line| format!("<li>{}</li>", html_escape(line)))
        .collect::<String>();

    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh}">
<title>{title}</title>
<style>
body {{ font-family: Arial, sans-serif; padding: 2rem; }}
.cards {{ display: flex; gap: 1rem; }}
.card {{ flex: 1; border-radius: 10px; padding: 1rem; text-align: center; }}
.card h2 {{ font-size: 14pt; }}
.card .value {{ font-size: 32pt; font-weight: bold; margin: 0.5rem 0; }}
.error {{ background: #FFCDD2; color: #B71C1C; padding: 0.75rem; border-radius: 8px; margin-bottom: 1rem; }}
button {{ background: #43A047; color: white; font-weight: bold; border: none; border-radius: 10px; padding: 10px 20px; font-size: 16px; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>Share this dashboard: <a href="{share}">{share}</a></p>
{banner}<div class="cards">{cards}</div>
<form method="post" action="/api/refresh"><button type="submit">Refresh Now</button></form>
<h2>History</h2>
<ul class="history">{history}</ul>
</body>
</html>"#,
        refresh = opts.refresh_seconds.max(1),
        title = TITLE,
        share = html_escape(opts.share_url),
        banner = banner,
        cards = cards,
        history = history,
    )
}

/// three "label: value" lines, or the failure warning
pub fn latest_lines(latest: Option<&Reading>) -> Vec<String> {
    match latest {
        Some(reading) => Vital::ALL
            .iter()
            .map(|&v| format!("{}: {}", v.label(), reading.display(v)))
            .collect(),
        None => vec![FETCH_FAILED.to_string()],
    }
}

/// at most `limit` history lines, newest first
pub fn history_lines(history: &[Reading], limit: usize) -> Vec<String> {
    if history.is_empty() {
        return vec![NO_HISTORY.to_string()];
    }
    recent(history, limit).iter().map(Reading::to_string).collect()
}
