//! Engine types
//!
//! The per-run context handed to every fetcher, and sync statistics.

use crate::config::TapConfig;
use crate::error::Result;
use crate::fetch::Endpoints;
use crate::http::HttpClient;
use crate::state::StateManager;
use crate::types::JsonValue;
use std::collections::BTreeMap;

/// Everything a sync invocation shares between its fetchers
#[derive(Debug)]
pub struct SyncContext {
    /// Run configuration
    pub config: TapConfig,
    /// Authenticated transport
    pub client: HttpClient,
    /// Request URLs for the configured account
    pub endpoints: Endpoints,
    /// Bookmarks for this run
    pub state: StateManager,
}

impl SyncContext {
    /// Build a context, deriving endpoints from the config
    pub fn new(config: TapConfig, client: HttpClient, state: StateManager) -> Result<Self> {
        let endpoints = Endpoints::new(&config.api_url, config.account.clone())?;
        Ok(Self {
            config,
            client,
            endpoints,
            state,
        })
    }

    /// Start point for an incremental sync, seeded from `start_date`
    pub fn get_start(&mut self, state_key: &str) -> Result<JsonValue> {
        self.state
            .get_start(state_key, self.config.start_date.as_deref())
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    /// Total records written
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Top-level streams synced
    pub streams_synced: usize,
    /// STATE messages written
    pub checkpoints: usize,
    /// Records per stream id
    pub stream_records: BTreeMap<String, usize>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records for a stream
    pub fn add_records(&mut self, stream: &str, count: usize) {
        self.records_synced += count;
        *self.stream_records.entry(stream.to_string()).or_default() += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a checkpoint
    pub fn add_checkpoint(&mut self) {
        self.checkpoints += 1;
    }

    /// Records written for one stream
    pub fn records_for(&self, stream: &str) -> usize {
        self.stream_records.get(stream).copied().unwrap_or(0)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
