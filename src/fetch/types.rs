//! Page and row types shared by every fetcher

use crate::catalog::LAST_MODIFIED;
use crate::flatten::flatten;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// One page of rows, in the datasource query response shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Cursor for the next page; absent or empty on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,

    /// Rows on this page
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rows: Vec<Row>,
}

impl Page {
    /// Create a page from rows
    pub fn new(rows: Vec<Row>, continuation_token: Option<String>) -> Self {
        Self {
            continuation_token,
            rows,
        }
    }

    /// Parse a page from a response document.
    ///
    /// Documents of an unexpected shape are logged and read as no data.
    pub fn from_value(value: JsonValue) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Discarding response with unexpected shape: {e}");
                None
            }
        }
    }

    /// Continuation token, if another page follows
    pub fn next_token(&self) -> Option<&str> {
        self.continuation_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// One row as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// The entity itself
    #[serde(rename = "rowData", default, deserialize_with = "null_as_empty_object")]
    pub row_data: JsonObject,

    /// Out-of-band modification time, merged into the record when present
    #[serde(
        rename = "lastModified",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<JsonValue>,
}

impl Row {
    /// Wrap an entity as a row
    pub fn new(row_data: JsonObject) -> Self {
        Self {
            row_data,
            last_modified: None,
        }
    }

    /// Merge the sibling `lastModified` into the entity and flatten it
    pub fn into_record(self) -> JsonObject {
        let mut merged = self.row_data;
        if let Some(last_modified) = self.last_modified {
            merged.insert(LAST_MODIFIED.to_string(), last_modified);
        }
        flatten(&merged)
    }
}

/// Keep an explicit `null` as `Some(Null)`, distinct from an absent field
fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Row>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_object<'de, D>(deserializer: D) -> Result<JsonObject, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<JsonObject>::deserialize(deserializer)?.unwrap_or_default())
}
