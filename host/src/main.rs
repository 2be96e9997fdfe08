//! ==============================================================================
//! main.rs - vitals monitor entry point
//! ==============================================================================
//!
//! purpose:
//!     polls a realtime database node holding heart rate / SpO₂ / temperature
//!     records and presents the newest reading plus a short history.
//!
//! modes (--mode or MONITOR_MODE):
//!     - dashboard: web server with html page + json api, fed by a poll loop
//!     - watch: terminal view with manual refresh and a history toggle
//!
//! relationships:
//!     - uses: config.rs (monitor.toml), fetcher.rs (http polling),
//!       server.rs (dashboard), watch.rs (terminal view)
//!
//! architecture (dashboard mode):
//!
//!     ┌─────────────────────────────────────────────────────┐
//!     │                  rust host (this file)              │
//!     │  ┌─────────────┐              ┌─────────────────┐   │
//!     │  │ poll loop   │   writes     │ web server      │   │
//!     │  │ (2s cycle)  │ ──────────▶  │ (port 8501)     │   │
//!     │  └──────┬──────┘  shared      └────────┬────────┘   │
//!     │         │         state                │ POST       │
//!     │         │                              │ /api/refresh
//!     │         └──────────────┬───────────────┘            │
//!     │                        │                            │
//!     │                  ┌─────┴─────┐                      │
//!     │                  │  fetcher  │ <- fetcher.rs        │
//!     │                  └─────┬─────┘                      │
//!     └────────────────────────┼────────────────────────────┘
//!                              │ HTTP GET (json)
//!                              ▼
//!                    realtime database node
//!
//! ==============================================================================

mod config;
mod domain;
mod error;
mod fetcher;
mod render;
mod server;
mod watch;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::MonitorConfig;
use domain::DashboardState;
use fetcher::HttpSource;
use server::ServerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// web dashboard + json api
    Dashboard,
    /// terminal view
    Watch,
}

#[derive(Debug, Parser)]
#[command(name = "vitals-monitor", version, about = "Real-time health monitor for a realtime database node")]
struct Cli {
    /// config file (default: config/monitor.toml or ../config/monitor.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// presentation mode
    #[arg(long, env = "MONITOR_MODE", value_enum, default_value_t = Mode::Dashboard)]
    mode: Mode,

    /// database url, overrides source.url
    #[arg(long)]
    url: Option<String>,
}

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // startup banner
    println!("===========================================================");
    println!("  Real-Time Health Monitor");
    println!("===========================================================");

    // step 1: load configuration
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MonitorConfig::load_or_default(),
    };
    if let Some(url) = cli.url {
        config.source.url = url;
    }
    config.print_summary();

    // step 2: logging (RUST_LOG wins over the config level)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // step 3: http source
    let source = HttpSource::new(&config.source)?;
    info!("Polling {}", source.url());

    match cli.mode {
        Mode::Dashboard => run_dashboard(config, source).await,
        Mode::Watch => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            watch::run_watch(&source, &config.polling, stdin, &mut stdout).await
        }
    }
}

// ==============================================================================
// dashboard mode
// ==============================================================================

async fn run_dashboard(config: MonitorConfig, source: HttpSource) -> Result<()> {
    let state = Arc::new(RwLock::new(DashboardState::default()));
    let source = Arc::new(source);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_address)
        .await
        .with_context(|| format!("binding {}", config.server.listen_address))?;

    let ctx = ServerContext {
        state: state.clone(),
        source: source.clone(),
        share_url: config.server.share_url(),
        refresh_seconds: config.server.page_refresh_seconds,
        history_limit: config.polling.history_limit,
    };
    let address = config.server.listen_address.clone();
    tokio::spawn(async move {
        info!("Dashboard live at http://{}", address);
        if let Err(e) = server::run_server(listener, ctx).await {
            tracing::error!("Web server error: {}", e);
        }
    });

    // main polling loop
    server::poll_loop(
        source.as_ref(),
        &state,
        config.polling.latest_interval(),
        config.logging.show_readings,
    )
    .await;
    Ok(())
}
