//! Catalog types
//!
//! Serialized in the standard catalog layout: one entry per stream with its
//! schema, key properties and breadcrumb metadata.

use crate::error::{Error, Result, ResultExt};
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Replication key shared by the incremental streams
pub const LAST_MODIFIED: &str = "lastModified";

/// How a stream's rows are fetched and processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamKind {
    /// Generic paged datasource query
    #[default]
    Datasource,
    /// Work items, with detail, history and activity fan-out
    WorkItem,
    /// Per work item history stages, driven by the work-item stream
    WorkItemHistory,
    /// Per work item activities, driven by the work-item stream
    Activity,
    /// Appointments searched by the full user list
    Appointment,
}

impl StreamKind {
    /// Resolve the kind from a catalog stream id
    pub fn from_stream_id(tap_stream_id: &str) -> Self {
        match tap_stream_id {
            "workitem_stream" => Self::WorkItem,
            "workitemhistory_stream" => Self::WorkItemHistory,
            "activity_stream" => Self::Activity,
            "appointment_stream" => Self::Appointment,
            _ => Self::Datasource,
        }
    }

    /// Child streams are only synced while processing their parent's rows
    pub fn is_child(self) -> bool {
        matches!(self, Self::WorkItemHistory | Self::Activity)
    }
}

/// One metadata entry addressed by its breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream itself
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    /// Metadata values
    #[serde(default)]
    pub metadata: JsonObject,
}

impl MetadataEntry {
    /// Root (stream level) entry
    pub fn root(metadata: JsonObject) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Whether this entry describes the stream itself
    pub fn is_root(&self) -> bool {
        self.breadcrumb.is_empty()
    }
}

/// A stream entry in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    /// Stream identity, used in every message
    pub tap_stream_id: String,

    /// Table name, stripped of characters downstream targets reject
    pub stream: String,

    /// Datasource alias used in request URLs
    #[serde(default)]
    pub stream_alias: Option<String>,

    /// JSON schema of the flattened records
    #[serde(default)]
    pub schema: JsonValue,

    /// Fields forming the natural key
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Field used as the incremental bookmark
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Replication method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<ReplicationMethod>,

    /// Breadcrumb metadata, including selection
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,

    #[serde(skip)]
    kind: StreamKind,
}

impl Stream {
    /// Create a stream entry, resolving its kind from the id
    pub fn new(
        tap_stream_id: impl Into<String>,
        stream: impl Into<String>,
        stream_alias: Option<String>,
        schema: JsonValue,
    ) -> Self {
        let tap_stream_id = tap_stream_id.into();
        let kind = StreamKind::from_stream_id(&tap_stream_id);
        Self {
            tap_stream_id,
            stream: stream.into(),
            stream_alias,
            schema,
            key_properties: Vec::new(),
            replication_key: None,
            replication_method: None,
            metadata: Vec::new(),
            kind,
        }
    }

    /// How this stream is fetched
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Recompute the kind after deserialization
    pub(crate) fn resolve_kind(&mut self) {
        self.kind = StreamKind::from_stream_id(&self.tap_stream_id);
    }

    /// Replication key, when the stream has one
    pub fn replication_key(&self) -> Option<&str> {
        self.replication_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Stream-level metadata
    pub fn root_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.is_root())
            .map(|m| &m.metadata)
    }

    /// Whether the stream's root metadata marks it selected
    pub fn is_selected(&self) -> bool {
        self.root_metadata()
            .and_then(|m| m.get("selected"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Set the `selected` flag on the root metadata entry
    pub fn set_selected(&mut self, selected: bool) {
        let value = JsonValue::Bool(selected);
        match self.metadata.iter_mut().find(|m| m.is_root()) {
            Some(root) => {
                root.metadata.insert("selected".to_string(), value);
            }
            None => {
                let mut metadata = JsonObject::new();
                metadata.insert("selected".to_string(), value);
                self.metadata.insert(0, MetadataEntry::root(metadata));
            }
        }
    }
}

/// The catalog of available streams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams in sync order
    pub streams: Vec<Stream>,
}

impl Catalog {
    /// Create a catalog from stream entries
    pub fn new(streams: Vec<Stream>) -> Self {
        Self { streams }
    }

    /// Parse a catalog, resolving each stream's kind
    pub fn from_json(json: &str) -> Result<Self> {
        let mut catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| Error::catalog(format!("Invalid catalog JSON: {e}")))?;
        for stream in &mut catalog.streams {
            stream.resolve_kind();
        }
        Ok(catalog)
    }

    /// Read and parse a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Look up a stream by id
    pub fn get_stream(&self, tap_stream_id: &str) -> Option<&Stream> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Selected streams, in catalog order
    pub fn selected_streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter().filter(|s| s.is_selected())
    }

    /// Selected stream of the given kind, if any
    pub fn selected_of_kind(&self, kind: StreamKind) -> Option<&Stream> {
        self.selected_streams().find(|s| s.kind() == kind)
    }

    /// Pretty JSON for `--discover`
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}
