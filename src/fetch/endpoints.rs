//! Request URLs for one account

use crate::error::{Error, Result};
use url::Url;

/// Builds API URLs under one authority and account
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    account: String,
}

impl Endpoints {
    /// Create endpoints for `account` under `api_url`
    pub fn new(api_url: &str, account: impl Into<String>) -> Result<Self> {
        let base = Url::parse(api_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::invalid_value("api_url", "must be a base URL"));
        }
        Ok(Self {
            base,
            account: account.into(),
        })
    }

    /// `POST /datagateway/v3/{account}/datasources/ref/{alias}/data/query`
    pub fn datasource_query(&self, alias: &str) -> String {
        self.build(&[
            "datagateway",
            "v3",
            &self.account,
            "datasources",
            "ref",
            alias,
            "data",
            "query",
        ])
    }

    /// `POST /workflow/v4/{account}/workItems/search`
    pub fn work_item_search(&self) -> String {
        self.build(&["workflow", "v4", &self.account, "workItems", "search"])
    }

    /// `GET /workflow/v4/{account}/workItems/id/{id}`
    pub fn work_item_detail(&self, work_item_id: &str) -> String {
        self.build(&["workflow", "v4", &self.account, "workItems", "id", work_item_id])
    }

    /// `GET /workflow/v4/{account}/workItems/id/{id}/history`
    pub fn work_item_history(&self, work_item_id: &str) -> String {
        self.build(&[
            "workflow",
            "v4",
            &self.account,
            "workItems",
            "id",
            work_item_id,
            "history",
        ])
    }

    /// `GET /activity/v2/{account}/activities/context/{id}`
    pub fn activities(&self, context_id: &str) -> String {
        self.build(&["activity", "v2", &self.account, "activities", "context", context_id])
    }

    /// `POST /calendar/v2/{account}/appointments/search/users`
    pub fn appointment_search(&self) -> String {
        self.build(&["calendar", "v2", &self.account, "appointments", "search", "users"])
    }

    fn build(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }
}
