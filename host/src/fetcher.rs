//! ==============================================================================
//! fetcher.rs - realtime database polling
//! ==============================================================================
//!
//! purpose:
//!     pulls the monitoring node from the realtime database with a plain GET
//!     and turns the decoded document into readings.
//!
//! document shape:
//!     { "<key>": { "BPM": 72, "SpO2": 98, "Temp": 36.6 }, ... }
//!
//!     keys are opaque server-assigned labels. the latest reading is the one
//!     under the lexicographically greatest key. this matches push ids, which
//!     sort in creation order, but nothing checks that for other key schemes.
//!
//! failure model:
//!     network errors, non-200 status and malformed bodies are all logged
//!     and then collapse into "no data" (None / empty history). no retry.
//!
//! relationships:
//!     - used by: main.rs (dashboard poll loop), server.rs (manual refresh),
//!       watch.rs (terminal view)
//!     - uses: domain.rs (Reading), error.rs (FetchError), config.rs (SourceConfig)
//!
//! ==============================================================================

use crate::config::SourceConfig;
use crate::domain::Reading;
use crate::error::FetchError;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

// ==============================================================================
// document selection
// ==============================================================================

/// the reading under the greatest key, if the document is a non-empty object
pub fn latest_from(document: &Value) -> Option<Reading> {
    let entries = document.as_object()?;
    let (_, value) = entries.iter().max_by(|(a, _), (b, _)| a.cmp(b))?;
    // an empty record counts as no data
    value.as_object().filter(|o| !o.is_empty())?;
    decode_reading(value)
}

/// every reading in document order; non-object entries are skipped,
/// empty objects come back as an all-absent reading
pub fn history_from(document: &Value) -> Vec<Reading> {
    match document.as_object() {
        Some(entries) => entries.values().filter_map(decode_reading).collect(),
        None => Vec::new(),
    }
}

fn decode_reading(value: &Value) -> Option<Reading> {
    value.as_object()?;
    Reading::deserialize(value).ok()
}

/// latest and history taken from one response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub latest: Option<Reading>,
    pub history: Vec<Reading>,
    /// false when the request itself failed, as opposed to an empty node
    pub fetched: bool,
}

impl Snapshot {
    pub fn from_document(document: &Value) -> Self {
        Self { latest: latest_from(document), history: history_from(document), fetched: true }
    }
}

// ==============================================================================
// source abstraction
// ==============================================================================

/// anything that can hand back the monitoring document
///
/// the provided methods are the public fetch api: each one issues its own
/// request and never fails, mapping every error to "no data".
pub trait ReadingSource: Send + Sync {
    fn fetch_document(&self) -> impl Future<Output = Result<Value, FetchError>> + Send;

    /// newest reading, or None when nothing could be fetched
    fn latest(&self) -> impl Future<Output = Option<Reading>> + Send {
        async move {
            match self.fetch_document().await {
                Ok(document) => latest_from(&document),
                Err(e) => {
                    warn!("Error fetching health data: {}", e);
                    None
                }
            }
        }
    }

    /// all stored readings, empty when nothing could be fetched
    fn history(&self) -> impl Future<Output = Vec<Reading>> + Send {
        async move {
            match self.fetch_document().await {
                Ok(document) => history_from(&document),
                Err(e) => {
                    warn!("Error fetching historical data: {}", e);
                    Vec::new()
                }
            }
        }
    }

    /// latest and history from a single request
    fn snapshot(&self) -> impl Future<Output = Snapshot> + Send {
        async move {
            match self.fetch_document().await {
                Ok(document) => Snapshot::from_document(&document),
                Err(e) => {
                    warn!("Error fetching health data: {}", e);
                    Snapshot::default()
                }
            }
        }
    }
}

// ==============================================================================
// http source
// ==============================================================================

#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    max_body_bytes: u64,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client, url: config.url.clone(), max_body_bytes: config.max_body_bytes })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReadingSource for HttpSource {
    fn fetch_document(&self) -> impl Future<Output = Result<Value, FetchError>> + Send {
        async move {
            debug!("GET {}", self.url);
            let response = self.client.get(&self.url).send().await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(FetchError::Status(status));
            }
            if let Some(len) = response.content_length().filter(|&len| len > self.max_body_bytes) {
                return Err(FetchError::TooLarge(len));
            }
            let body = response.bytes().await?;
            if body.len() as u64 > self.max_body_bytes {
                return Err(FetchError::TooLarge(body.len() as u64));
            }
            Ok(serde_json::from_slice(&body)?)
        }
    }
}

// ==============================================================================
// tests
// ==============================================================================

/// in-memory source for presenter tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct StaticSource {
        document: Mutex<Option<Value>>,
        fetches: AtomicUsize,
    }

    impl StaticSource {
        pub fn new(document: Value) -> Self {
            Self { document: Mutex::new(Some(document)), fetches: AtomicUsize::new(0) }
        }

        /// a source whose every fetch fails
        pub fn failing() -> Self {
            Self::default()
        }

        pub fn set(&self, document: Option<Value>) {
            *self.document.lock().unwrap() = document;
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ReadingSource for StaticSource {
        fn fetch_document(&self) -> impl Future<Output = Result<Value, FetchError>> + Send {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let document = self.document.lock().unwrap().clone();
            async move { document.ok_or(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)) }
        }
    }
}
