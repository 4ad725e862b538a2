//! Per-stream fetchers
//!
//! Each stream family pages through the API its own way; every fetcher
//! normalizes its responses into the same `Page` of `Row`s so the engine can
//! drive them with one loop.
//!
//! # Overview
//!
//! - `Fetcher` - paged top-level streams (datasource, work-item search,
//!   appointments)
//! - `ChildFetcher` - per work item fan-out (history, activity)
//! - `fetch_work_item_detail` - single work item detail
//! - `Endpoints` - request URLs for an account

mod endpoints;
mod fetchers;
mod transform;
mod types;

pub use endpoints::Endpoints;
pub use fetchers::{
    child_fetcher_for, fetch_work_item_detail, fetcher_for, ActivityFetcher, AppointmentFetcher,
    ChildFetcher, DatasourceFetcher, Fetcher, HistoryFetcher, WorkItemSearchFetcher, USERS_ALIAS,
};
pub use transform::{activity_page, appointment_page, history_page, search_page};
pub use types::{Page, Row};
