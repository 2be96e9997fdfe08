//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `monitor.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - SourceConfig: Where the readings live (database url, request timeout).
//!     - PollingConfig: How often latest/history are refreshed, history length.
//!     - ServerConfig: Dashboard listen address, share link, page refresh.
//!     - LoggingConfig: Log level and whether each poll logs its reading.
//!
//! every section is optional; a partial file is filled in from defaults.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// the realtime database node holding the monitoring records
pub const DEFAULT_SOURCE_URL: &str =
    "https://libra-tacticl-suit-default-rtdb.asia-southeast1.firebasedatabase.app/RealtimeMonitoring.json";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    /// 0 disables the timeout
    pub timeout_seconds: u64,
    /// responses larger than this are dropped as a failed fetch
    pub max_body_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub latest_interval_seconds: u64,
    pub history_interval_seconds: u64,
    pub history_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub share_url: Option<String>,
    pub page_refresh_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_readings: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { url: DEFAULT_SOURCE_URL.to_string(), timeout_seconds: 10, max_body_bytes: 8 * 1024 * 1024 }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { latest_interval_seconds: 2, history_interval_seconds: 5, history_limit: 20 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8501".to_string(),
            share_url: None,
            page_refresh_seconds: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_readings: true }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

impl PollingConfig {
    /// intervals of zero would spin; clamp to one second
    pub fn latest_interval(&self) -> Duration {
        Duration::from_secs(self.latest_interval_seconds.max(1))
    }

    pub fn history_interval(&self) -> Duration {
        Duration::from_secs(self.history_interval_seconds.max(1))
    }
}

impl ServerConfig {
    /// link printed on the dashboard so other devices can open it
    pub fn share_url(&self) -> String {
        if let Some(url) = &self.share_url {
            return url.clone();
        }
        let port = self
            .listen_address
            .rsplit_once(':')
            .map(|(_, port)| port)
            .unwrap_or("8501");
        format!("http://localhost:{}", port)
    }
}

impl MonitorConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: MonitorConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        let paths = [
            PathBuf::from("config").join("monitor.toml"),
            PathBuf::from("..").join("config").join("monitor.toml"),
        ];
        Self::load_first(&paths)
    }

    fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│          MONITOR CONFIGURATION          │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Source: {}", self.source.url);
        println!("│ Timeout: {}", match self.source.timeout() {
            Some(t) => format!("{}s", t.as_secs()),
            None => "none".to_string(),
        });
        println!("│ Latest Interval: {}s", self.polling.latest_interval().as_secs());
        println!("│ History Interval: {}s (last {})",
            self.polling.history_interval().as_secs(), self.polling.history_limit);
        println!("│ Listen: {}", self.server.listen_address);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
