//! Protocol messages

use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message on the output stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Declares a stream's schema; precedes its records
    Schema {
        /// Stream id
        stream: String,
        /// JSON schema of the records
        schema: JsonValue,
        /// Natural key fields
        key_properties: Vec<String>,
        /// Bookmark fields, for incremental streams
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One flattened record
    Record {
        /// Stream id
        stream: String,
        /// Flat field map
        record: JsonObject,
        /// When the record was read
        time_extracted: DateTime<Utc>,
    },
    /// The full bookmark map
    State {
        /// Bookmarks keyed by state key
        value: JsonValue,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties,
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: JsonObject) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Stream the message belongs to; STATE has none
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Record payload, if this is a record message
    pub fn as_record(&self) -> Option<&JsonObject> {
        match self {
            Self::Record { record, .. } => Some(record),
            _ => None,
        }
    }

    /// State payload, if this is a state message
    pub fn as_state(&self) -> Option<&JsonValue> {
        match self {
            Self::State { value } => Some(value),
            _ => None,
        }
    }
}
