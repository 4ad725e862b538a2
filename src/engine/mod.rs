//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - writes schemas, then pages through every selected stream
//! - `SyncContext` - config, transport, endpoints and state for one run
//! - `SyncStats` - counters reported at the end of a run
//!
//! Work-item rows drive the history and activity streams: their records (and
//! a STATE checkpoint) are written while the parent row is processed, before
//! the parent page's own records.

mod types;

pub use types::{SyncContext, SyncStats};

use crate::catalog::{Catalog, Stream, StreamKind, LAST_MODIFIED};
use crate::config::TapConfig;
use crate::error::Result;
use crate::fetch::{child_fetcher_for, fetch_work_item_detail, fetcher_for, Page, Row};
use crate::flatten::flatten;
use crate::http::HttpClient;
use crate::output::{Message, MessageSink};
use crate::state::StateManager;
use crate::types::{JsonObject, JsonValue};
use std::time::Instant;
use tracing::{debug, error, info};

/// Child streams driven by each work-item row, in emission order
const WORK_ITEM_CHILDREN: [StreamKind; 2] = [StreamKind::WorkItemHistory, StreamKind::Activity];

/// Stage fields a history row takes its `lastModified` from, by preference
const HISTORY_TIMESTAMPS: [&str; 2] = [
    "stage_transition_transitionedAt",
    "stage_transition_receivedAt",
];

/// Sync engine for orchestrating data extraction
#[derive(Debug)]
pub struct SyncEngine {
    ctx: SyncContext,
    catalog: Catalog,
}

impl SyncEngine {
    /// Create an engine with a transport built from the config
    pub fn new(config: TapConfig, catalog: Catalog, state: StateManager) -> Result<Self> {
        let client = HttpClient::from_tap_config(&config)?;
        Self::with_client(config, client, catalog, state)
    }

    /// Create an engine with a custom transport
    pub fn with_client(
        config: TapConfig,
        client: HttpClient,
        catalog: Catalog,
        state: StateManager,
    ) -> Result<Self> {
        Ok(Self {
            ctx: SyncContext::new(config, client, state)?,
            catalog,
        })
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.ctx.state
    }

    /// Get the catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Consume the engine, returning the final state
    pub fn into_state(self) -> StateManager {
        self.ctx.state
    }

    /// Sync every selected stream, writing protocol messages to `sink`
    pub async fn run(&mut self, sink: &mut dyn MessageSink) -> Result<SyncStats> {
        let start = Instant::now();
        let mut stats = SyncStats::new();

        let mut run = StreamRun {
            ctx: &mut self.ctx,
            catalog: &self.catalog,
            sink,
            stats: &mut stats,
        };
        run.write_schemas()?;

        for stream in self.catalog.selected_streams() {
            if stream.kind().is_child() {
                debug!(stream = %stream.tap_stream_id, "Synced through its parent stream");
                continue;
            }
            run.sync_stream(stream).await?;
        }

        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            records = stats.records_synced,
            pages = stats.pages_fetched,
            streams = stats.streams_synced,
            duration_ms = stats.duration_ms,
            "Sync completed"
        );
        Ok(stats)
    }
}

/// Borrowed state of one `run` invocation
struct StreamRun<'a> {
    ctx: &'a mut SyncContext,
    catalog: &'a Catalog,
    sink: &'a mut dyn MessageSink,
    stats: &'a mut SyncStats,
}

impl StreamRun<'_> {
    /// One SCHEMA message per selected stream, before any record
    fn write_schemas(&mut self) -> Result<()> {
        for stream in self.catalog.selected_streams() {
            let bookmark_properties = stream
                .replication_key()
                .map(|k| vec![k.to_string()])
                .unwrap_or_default();
            self.sink.write(Message::schema(
                stream.tap_stream_id.clone(),
                stream.schema.clone(),
                stream.key_properties.clone(),
                bookmark_properties,
            ))?;
        }
        Ok(())
    }

    /// Page through a top-level stream until no continuation token remains
    async fn sync_stream(&mut self, stream: &Stream) -> Result<()> {
        info!("Syncing stream:{}", stream.tap_stream_id);
        let fetcher = fetcher_for(stream.kind(), &self.ctx.config);
        let state_key = fetcher.state_key(stream);

        let mut continuation: Option<String> = None;
        let mut count = 0;
        loop {
            let page = fetcher
                .fetch_page(self.ctx, stream, continuation.as_deref())
                .await?;
            let Some(page) = page else {
                break;
            };
            self.stats.add_page();

            continuation = page.next_token().map(ToString::to_string);
            count += self.process_page(stream, &state_key, page).await?;

            if continuation.is_none() {
                break;
            }
        }

        self.stats.add_stream();
        info!(stream = %stream.tap_stream_id, count, "Finished stream");
        Ok(())
    }

    /// Turn a page into records, running child syncs, then write them
    async fn process_page(&mut self, stream: &Stream, state_key: &str, page: Page) -> Result<usize> {
        let mut records = Vec::with_capacity(page.rows.len());
        for row in page.rows {
            let record = match stream.kind() {
                StreamKind::WorkItem => self.process_work_item(row).await?,
                _ => row.into_record(),
            };
            records.push(record);
        }
        self.write_records(stream, state_key, records).await
    }

    /// Merge detail, sync history and activity, and flatten a work-item row
    async fn process_work_item(&mut self, row: Row) -> Result<JsonObject> {
        let item = row.row_data;
        let work_item_id = item
            .get("workItemId")
            .and_then(JsonValue::as_str)
            .map(ToString::to_string);

        let mut merged = item.clone();
        if let Some(id) = work_item_id.as_deref() {
            if self.ctx.config.workitem_detail_enabled {
                if let Some(detail) = fetch_work_item_detail(self.ctx, id).await? {
                    merged.extend(detail);
                }
            }

            let last_modified = item.get(LAST_MODIFIED);
            self.sync_children(id, last_modified).await?;
        } else {
            debug!("Work item row without workItemId, skipping fan-out");
        }

        Ok(flatten(&merged))
    }

    /// Write history and activity records for one work item
    async fn sync_children(
        &mut self,
        work_item_id: &str,
        parent_last_modified: Option<&JsonValue>,
    ) -> Result<()> {
        let catalog = self.catalog;
        for kind in WORK_ITEM_CHILDREN {
            let Some(stream) = catalog.selected_of_kind(kind) else {
                continue;
            };
            let Some(fetcher) = child_fetcher_for(kind) else {
                continue;
            };
            let Some(page) = fetcher.fetch_for(self.ctx, work_item_id).await? else {
                continue;
            };

            let records: Vec<JsonObject> = page
                .rows
                .into_iter()
                .map(|row| match kind {
                    StreamKind::WorkItemHistory => history_record(row, parent_last_modified),
                    _ => row.into_record(),
                })
                .collect();

            let count = self
                .write_records(stream, &stream.tap_stream_id, records)
                .await?;
            if count > 0 {
                info!(stream = %stream.tap_stream_id, count, "Synced child records");
            }
        }
        Ok(())
    }

    /// Emit records, advance the bookmark under `state_key`, then checkpoint.
    ///
    /// Rows are assumed to arrive in ascending bookmark order, so the bookmark
    /// follows each row. Nothing is written for an empty batch.
    async fn write_records(
        &mut self,
        stream: &Stream,
        state_key: &str,
        records: Vec<JsonObject>,
    ) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let count = records.len();
        let bookmark_column = stream.replication_key();
        for record in records {
            let bookmark = bookmark_column.map(|column| (column, bookmark_value(&record, column)));
            self.sink
                .write(Message::record(stream.tap_stream_id.clone(), record))?;

            match bookmark {
                Some((_, Some(value))) => {
                    self.ctx.state.set_bookmark(state_key, value);
                }
                Some((column, None)) => {
                    error!(
                        "[{}] bookmark value not found in column [{column}]",
                        stream.tap_stream_id
                    );
                }
                None => {}
            }
        }

        self.stats.add_records(&stream.tap_stream_id, count);
        self.checkpoint().await?;
        Ok(count)
    }

    /// Write the full bookmark map and persist it
    async fn checkpoint(&mut self) -> Result<()> {
        debug!("Writing state {}", self.ctx.state.to_json()?);
        self.sink
            .write(Message::state(self.ctx.state.state().to_value()))?;
        self.ctx.state.save().await?;
        self.stats.add_checkpoint();
        Ok(())
    }
}

/// Bookmark value of a record: present, non-null and non-empty
fn bookmark_value(record: &JsonObject, column: &str) -> Option<JsonValue> {
    match record.get(column)? {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        value => Some(value.clone()),
    }
}

/// Flatten a history row and stamp its `lastModified`.
///
/// Prefers the stage transition time, then its receipt time, then the parent
/// work item's `lastModified`.
fn history_record(row: Row, parent_last_modified: Option<&JsonValue>) -> JsonObject {
    let mut record = flatten(&row.row_data);
    let last_modified = HISTORY_TIMESTAMPS
        .iter()
        .find_map(|field| record.get(*field).cloned())
        .or_else(|| parent_last_modified.cloned())
        .unwrap_or(JsonValue::Null);
    record.insert(LAST_MODIFIED.to_string(), last_modified);
    record
}

#[cfg(test)]
mod tests;
