//! Fetcher implementations
//!
//! One strategy per stream family, chosen once per stream from its kind.

use super::transform::{activity_page, appointment_page, history_page, search_page};
use super::types::Page;
use crate::catalog::{Stream, StreamKind, LAST_MODIFIED};
use crate::config::{SearchFilter, TapConfig};
use crate::engine::SyncContext;
use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use chrono::{Months, SecondsFormat, Utc};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Datasource the appointment fetcher lists users from
pub const USERS_ALIAS: &str = "users";

/// Fetches one page of a top-level stream
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the page after `continuation_token`; `None` means no data
    async fn fetch_page(
        &self,
        ctx: &mut SyncContext,
        stream: &Stream,
        continuation_token: Option<&str>,
    ) -> Result<Option<Page>>;

    /// Bookmark key the stream's records advance
    fn state_key(&self, stream: &Stream) -> String {
        stream.tap_stream_id.clone()
    }
}

/// Fetches the rows a single work item fans out into
#[async_trait]
pub trait ChildFetcher: Send + Sync {
    /// Fetch rows for one work item; `None` means no data
    async fn fetch_for(&self, ctx: &mut SyncContext, work_item_id: &str) -> Result<Option<Page>>;
}

/// Pick the fetcher for a top-level stream
pub fn fetcher_for(kind: StreamKind, config: &TapConfig) -> Box<dyn Fetcher> {
    match kind {
        StreamKind::WorkItem if !config.workitem_detail_enabled => {
            match config.workitem_filter.clone() {
                Some(filter) => Box::new(WorkItemSearchFetcher::with_filter(filter)),
                None => Box::new(WorkItemSearchFetcher::new()),
            }
        }
        StreamKind::Appointment => Box::new(AppointmentFetcher::new()),
        _ => Box::new(DatasourceFetcher),
    }
}

/// Pick the fetcher for a child stream
pub fn child_fetcher_for(kind: StreamKind) -> Option<Box<dyn ChildFetcher>> {
    match kind {
        StreamKind::WorkItemHistory => Some(Box::new(HistoryFetcher)),
        StreamKind::Activity => Some(Box::new(ActivityFetcher)),
        _ => None,
    }
}

fn continuation_body(continuation_token: Option<&str>) -> Option<JsonValue> {
    continuation_token
        .filter(|t| !t.is_empty())
        .map(|t| json!({ "continuationToken": t }))
}

// ============================================================================
// Datasource
// ============================================================================

/// Generic paged datasource query, keyed by the stream alias
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasourceFetcher;

impl DatasourceFetcher {
    /// Query one page of a datasource by alias
    pub async fn query(
        ctx: &SyncContext,
        alias: &str,
        continuation_token: Option<&str>,
    ) -> Result<Option<Page>> {
        let url = ctx.endpoints.datasource_query(alias);
        let body = continuation_body(continuation_token);
        let response = ctx.client.post_json(&url, body.as_ref()).await?;
        Ok(response.and_then(Page::from_value))
    }
}

#[async_trait]
impl Fetcher for DatasourceFetcher {
    async fn fetch_page(
        &self,
        ctx: &mut SyncContext,
        stream: &Stream,
        continuation_token: Option<&str>,
    ) -> Result<Option<Page>> {
        let Some(alias) = stream.stream_alias.as_deref() else {
            debug!(stream = %stream.tap_stream_id, "No datasource alias, nothing to fetch");
            return Ok(None);
        };
        Self::query(ctx, alias, continuation_token).await
    }
}

// ============================================================================
// Work-item search
// ============================================================================

/// Incremental work-item search, ascending on the replication key
#[derive(Debug, Clone, Default)]
pub struct WorkItemSearchFetcher {
    filter: Option<SearchFilter>,
}

impl WorkItemSearchFetcher {
    /// Search without a filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Search with a predefined filter group
    pub fn with_filter(filter: SearchFilter) -> Self {
        Self {
            filter: Some(filter),
        }
    }
}

#[async_trait]
impl Fetcher for WorkItemSearchFetcher {
    async fn fetch_page(
        &self,
        ctx: &mut SyncContext,
        stream: &Stream,
        continuation_token: Option<&str>,
    ) -> Result<Option<Page>> {
        let start = ctx.get_start(&self.state_key(stream))?;
        let order_by = stream.replication_key().unwrap_or(LAST_MODIFIED);

        let mut query = JsonObject::new();
        query.insert("lastModifiedAfter".to_string(), start.clone());
        query.insert("orderBy".to_string(), json!(order_by));
        query.insert("orderByDirection".to_string(), json!("ascending"));
        if let Some(token) = continuation_token.filter(|t| !t.is_empty()) {
            query.insert("continuationToken".to_string(), json!(token));
        }
        if let Some(filter) = &self.filter {
            info!("Syncing work-items with filter {}", filter.name);
            query.insert(
                "filterGroups".to_string(),
                json!([{ "filters": filter.filters }]),
            );
        }

        info!("Syncing work-items since {start}");
        let url = ctx.endpoints.work_item_search();
        let response = ctx
            .client
            .post_json(&url, Some(&JsonValue::Object(query)))
            .await?;
        Ok(response.and_then(search_page))
    }

    fn state_key(&self, stream: &Stream) -> String {
        match &self.filter {
            Some(filter) => format!("{}_{}", stream.tap_stream_id, filter.name),
            None => stream.tap_stream_id.clone(),
        }
    }
}

// ============================================================================
// Appointments
// ============================================================================

/// Appointments for every user, searched over a two-year window.
///
/// Lists all users to completion on the first page, then pages one
/// appointment search over that id list.
#[derive(Debug, Default)]
pub struct AppointmentFetcher {
    users: OnceCell<Vec<JsonValue>>,
}

impl AppointmentFetcher {
    /// Fetcher for one stream sync; users are listed once
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `userId` from the users datasource, in listing order
    pub async fn user_ids(ctx: &SyncContext) -> Result<Vec<JsonValue>> {
        let mut users = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let Some(page) = DatasourceFetcher::query(ctx, USERS_ALIAS, token.as_deref()).await?
            else {
                break;
            };
            token = page.next_token().map(ToString::to_string);
            users.extend(
                page.rows
                    .into_iter()
                    .filter_map(|mut row| row.row_data.remove("userId")),
            );
            if token.is_none() {
                break;
            }
        }

        debug!(count = users.len(), "Collected users for appointment search");
        Ok(users)
    }
}

#[async_trait]
impl Fetcher for AppointmentFetcher {
    async fn fetch_page(
        &self,
        ctx: &mut SyncContext,
        stream: &Stream,
        continuation_token: Option<&str>,
    ) -> Result<Option<Page>> {
        if stream.stream_alias.is_none() {
            return Ok(None);
        }
        let ctx: &SyncContext = ctx;
        let users = self.users.get_or_try_init(|| Self::user_ids(ctx)).await?;
        if users.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let one_year = Months::new(12);
        let from = now.checked_sub_months(one_year).unwrap_or(now);
        let to = now.checked_add_months(one_year).unwrap_or(now);

        let mut query = JsonObject::new();
        query.insert(
            "from".to_string(),
            json!(from.to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        query.insert("includeUnassigned".to_string(), json!(true));
        query.insert(
            "to".to_string(),
            json!(to.to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        query.insert("userIds".to_string(), JsonValue::Array(users.clone()));
        if let Some(token) = continuation_token.filter(|t| !t.is_empty()) {
            query.insert("continuationToken".to_string(), json!(token));
        }

        let url = ctx.endpoints.appointment_search();
        let response = ctx
            .client
            .post_json(&url, Some(&JsonValue::Object(query)))
            .await?;
        Ok(response.and_then(appointment_page))
    }
}

// ============================================================================
// Work-item children
// ============================================================================

/// Fetch a work item's detail document
pub async fn fetch_work_item_detail(
    ctx: &SyncContext,
    work_item_id: &str,
) -> Result<Option<JsonObject>> {
    let url = ctx.endpoints.work_item_detail(work_item_id);
    match ctx.client.get_json(&url).await? {
        Some(JsonValue::Object(detail)) => Ok(Some(detail)),
        Some(_) => {
            warn!("Discarding work item {work_item_id} detail that is not an object");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// One row per lifecycle stage of a work item
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFetcher;

#[async_trait]
impl ChildFetcher for HistoryFetcher {
    async fn fetch_for(&self, ctx: &mut SyncContext, work_item_id: &str) -> Result<Option<Page>> {
        let url = ctx.endpoints.work_item_history(work_item_id);
        let response = ctx.client.get_json(&url).await?;
        Ok(response.and_then(|r| history_page(r, work_item_id)))
    }
}

/// One row per activity recorded against a work item
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityFetcher;

#[async_trait]
impl ChildFetcher for ActivityFetcher {
    async fn fetch_for(&self, ctx: &mut SyncContext, work_item_id: &str) -> Result<Option<Page>> {
        let url = ctx.endpoints.activities(work_item_id);
        let response = ctx.client.get_json(&url).await?;
        Ok(response.and_then(activity_page))
    }
}
