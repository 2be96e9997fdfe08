//! ==============================================================================
//! server.rs - web dashboard
//! ==============================================================================
//!
//! purpose:
//!     serves the html dashboard and a small json api over the shared state
//!     the poll loop keeps current.
//!
//! routes:
//!     GET  /             html dashboard (auto-refreshing page)
//!     GET  /api/latest   newest reading + last update time
//!     GET  /api/history  last N readings, newest first
//!     POST /api/refresh  fetch now, then redirect back to /
//!
//! relationships:
//!     - used by: main.rs (spawned next to the poll loop)
//!     - uses: fetcher.rs (manual refresh), render.rs (html)
//!
//! ==============================================================================

use crate::domain::{now_ms, recent, DashboardState, Reading};
use crate::fetcher::ReadingSource;
use crate::render::{latest_lines, render_dashboard, PageOptions, FETCH_FAILED};

use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// everything the handlers need; cheap to clone
pub struct ServerContext<S> {
    pub state: Arc<RwLock<DashboardState>>,
    pub source: Arc<S>,
    pub share_url: String,
    pub refresh_seconds: u64,
    pub history_limit: usize,
}

impl<S> Clone for ServerContext<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            source: self.source.clone(),
            share_url: self.share_url.clone(),
            refresh_seconds: self.refresh_seconds,
            history_limit: self.history_limit,
        }
    }
}

#[derive(Serialize)]
struct LatestResponse {
    reading: Option<Reading>,
    last_update: u64,
}

/// fetch once and store the result; returns the latest reading, if any
///
/// a failed request clears the latest reading so the page shows the warning,
/// but keeps the previous history on screen. any successful response, an
/// emptied node included, replaces the history.
pub async fn refresh_state<S: ReadingSource>(source: &S, state: &RwLock<DashboardState>) -> Option<Reading> {
    let snapshot = source.snapshot().await;
    let mut guard = state.write().await;
    guard.latest = snapshot.latest.clone();
    if snapshot.fetched {
        guard.history = snapshot.history;
    }
    guard.last_update = now_ms();
    snapshot.latest
}

/// timer-driven refresh for the dashboard; runs until the task is dropped
pub async fn poll_loop<S: ReadingSource>(
    source: &S,
    state: &RwLock<DashboardState>,
    interval: Duration,
    show_readings: bool,
) {
    info!("Starting polling ({}s interval)", interval.as_secs());
    loop {
        match refresh_state(source, state).await {
            Some(reading) if show_readings => {
                info!("{}", latest_lines(Some(&reading)).join(" | "));
            }
            Some(_) => {}
            None => warn!("{}", FETCH_FAILED),
        }

        tokio::time::sleep(interval).await;
    }
}

pub fn router<S: ReadingSource + 'static>(ctx: ServerContext<S>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler::<S>))
        .route("/api/latest", get(latest_handler::<S>))
        .route("/api/history", get(history_handler::<S>))
        .route("/api/refresh", post(refresh_handler::<S>))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

pub async fn run_server<S: ReadingSource + 'static>(listener: TcpListener, ctx: ServerContext<S>) -> Result<()> {
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

async fn dashboard_handler<S: ReadingSource + 'static>(State(ctx): State<ServerContext<S>>) -> Html<String> {
    let state = ctx.state.read().await;
    let opts = PageOptions {
        share_url: &ctx.share_url,
        refresh_seconds: ctx.refresh_seconds,
        history_limit: ctx.history_limit,
    };
    Html(render_dashboard(&state, &opts))
}

async fn latest_handler<S: ReadingSource + 'static>(State(ctx): State<ServerContext<S>>) -> Json<LatestResponse> {
    let state = ctx.state.read().await;
    Json(LatestResponse { reading: state.latest.clone(), last_update: state.last_update })
}

async fn history_handler<S: ReadingSource + 'static>(State(ctx): State<ServerContext<S>>) -> Json<Vec<Reading>> {
    let state = ctx.state.read().await;
    Json(recent(&state.history, ctx.history_limit))
}

async fn refresh_handler<S: ReadingSource + 'static>(State(ctx): State<ServerContext<S>>) -> Redirect {
    info!("Manual refresh requested");
    let latest = refresh_state(ctx.source.as_ref(), &ctx.state).await;
    debug!("Manual refresh done (data: {})", latest.is_some());
    Redirect::to("/")
}
