//! Run configuration
//!
//! The JSON document passed with `--config`. Field names follow the keys the
//! Solarvista tap has always accepted, so existing config files keep working.

use crate::error::{Error, Result, ResultExt};
use crate::types::JsonValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default API authority
pub const DEFAULT_API_URL: &str = "https://api.solarvista.com";

/// Default token endpoint
pub const DEFAULT_AUTH_URL: &str = "https://auth.solarvista.com/connect/token";

// ============================================================================
// Tap Config
// ============================================================================

/// Configuration for a single tap invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TapConfig {
    /// Tenant identifier embedded in every API path
    #[serde(default)]
    pub account: String,

    /// ISO-8601 floor for incremental syncs without a bookmark
    #[serde(default)]
    pub start_date: Option<String>,

    /// Bearer token used directly, skipping the token exchange
    #[serde(default)]
    pub personal_access_token: Option<String>,

    /// Username for the password-grant exchange
    #[serde(default, rename = "clientId")]
    pub client_id: Option<String>,

    /// Password (one-time code) for the password-grant exchange
    #[serde(default)]
    pub code: Option<String>,

    /// Fetch every work item's detail and merge it into the list row
    #[serde(default, deserialize_with = "null_as_false")]
    pub workitem_detail_enabled: bool,

    /// Predefined filter group for the work-item search
    #[serde(default)]
    pub workitem_filter: Option<SearchFilter>,

    /// Datasources selected at discovery (empty = none selected)
    #[serde(default)]
    pub datasources: Vec<String>,

    /// API authority
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Token endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Retries for throttled, failed or timed out requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Optional client-side request rate limit
    #[serde(default)]
    pub max_requests_per_second: Option<u32>,
}

/// Named filter group sent with the work-item search.
///
/// The search resumes from its own bookmark, `<stream>_<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Suffix of the filter's state key
    pub name: String,
    /// Value sent as the group's `filters`
    pub filters: JsonValue,
}

impl SearchFilter {
    /// Create a named filter
    pub fn new(name: impl Into<String>, filters: JsonValue) -> Self {
        Self {
            name: name.into(),
            filters,
        }
    }
}

/// An explicit `null` switches the flag off
fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

impl TapConfig {
    /// Create a config for an account with defaults for everything else
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            api_url: default_api_url(),
            auth_url: default_auth_url(),
            request_timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            ..Self::default()
        }
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TapConfig = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Check required fields and URL syntax
    pub fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() {
            return Err(Error::missing_field("account"));
        }

        let has_token = self
            .personal_access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty());
        if !has_token {
            if self.client_id.as_deref().unwrap_or_default().is_empty() {
                return Err(Error::missing_field("clientId"));
            }
            if self.code.as_deref().unwrap_or_default().is_empty() {
                return Err(Error::missing_field("code"));
            }
        }

        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        url::Url::parse(&self.auth_url)
            .map_err(|e| Error::invalid_value("auth_url", e.to_string()))?;

        if self.request_timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "request_timeout_seconds",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Per-request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Builder-style setter for the personal access token
    #[must_use]
    pub fn with_personal_access_token(mut self, token: impl Into<String>) -> Self {
        self.personal_access_token = Some(token.into());
        self
    }

    /// Builder-style setter for password-grant credentials
    #[must_use]
    pub fn with_credentials(mut self, client_id: impl Into<String>, code: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.code = Some(code.into());
        self
    }

    /// Builder-style setter for the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Point both the API and token endpoint at another authority
    #[must_use]
    pub fn with_base_urls(mut self, api_url: impl Into<String>, auth_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.auth_url = auth_url.into();
        self
    }

    /// Enable or disable work-item detail fan-out
    #[must_use]
    pub fn with_workitem_detail(mut self, enabled: bool) -> Self {
        self.workitem_detail_enabled = enabled;
        self
    }

    /// Search work items through a predefined filter group
    #[must_use]
    pub fn with_workitem_filter(mut self, filter: SearchFilter) -> Self {
        self.workitem_filter = Some(filter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            "account": "acme",
            "start_date": "2020-05-14T14:14:14.455852+00:00",
            "personal_access_token": "token"
        }"#;

        let config = TapConfig::from_json(json).unwrap();
        assert_eq!(config.account, "acme");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.max_retries, 3);
        assert!(!config.workitem_detail_enabled);
        assert!(config.datasources.is_empty());
    }

    #[test]
    fn test_parse_password_grant_config() {
        let json = r#"{
            "account": "acme",
            "clientId": "client@acme.com",
            "code": "one-time-code",
            "workitem_detail_enabled": true,
            "datasources": ["site", "work-item"]
        }"#;

        let config = TapConfig::from_json(json).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("client@acme.com"));
        assert_eq!(config.code.as_deref(), Some("one-time-code"));
        assert!(config.workitem_detail_enabled);
        assert_eq!(config.datasources, vec!["site", "work-item"]);
    }

    #[test]
    fn test_detail_flag_null() {
        let json = r#"{
            "account": "acme",
            "personal_access_token": "t",
            "workitem_detail_enabled": null
        }"#;

        let config = TapConfig::from_json(json).unwrap();
        assert!(!config.workitem_detail_enabled);
    }

    #[test]
    fn test_parse_workitem_filter() {
        let json = r#"{
            "account": "acme",
            "personal_access_token": "t",
            "workitem_filter": {
                "name": "completed",
                "filters": [{"comparison": "equals", "fieldName": "isCompleted", "value": true}]
            }
        }"#;

        let config = TapConfig::from_json(json).unwrap();
        let filter = config.workitem_filter.unwrap();
        assert_eq!(filter.name, "completed");
        assert_eq!(filter.filters[0]["fieldName"], "isCompleted");
        assert!(TapConfig::from_json(r#"{"account": "acme", "personal_access_token": "t"}"#)
            .unwrap()
            .workitem_filter
            .is_none());
    }

    #[test]
    fn test_missing_account() {
        let err = TapConfig::from_json(r#"{"personal_access_token": "t"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "account"));
    }

    #[test]
    fn test_missing_credentials() {
        let err = TapConfig::from_json(r#"{"account": "acme", "clientId": "c"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "code"));

        let err = TapConfig::from_json(r#"{"account": "acme"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "clientId"));
    }

    #[test]
    fn test_invalid_api_url() {
        let config = TapConfig::new("acme")
            .with_personal_access_token("t")
            .with_base_urls("not a url", DEFAULT_AUTH_URL);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { field, .. } if field == "api_url"));
    }

    #[test]
    fn test_invalid_json() {
        let err = TapConfig::from_json("{not json").unwrap_err();
        assert!(err.to_string().contains("Invalid config JSON"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"account": "acme", "personal_access_token": "t"}"#).unwrap();

        let config = TapConfig::from_file(&path).unwrap();
        assert_eq!(config.account, "acme");

        let missing = TapConfig::from_file(dir.path().join("missing.json"));
        assert!(missing.is_err());
    }
}
