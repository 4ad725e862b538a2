//! Catalog discovery from the embedded stream schemas
//!
//! Discovery never contacts the API: the stream list is fixed and every
//! schema ships inside the binary.

use super::types::{Catalog, MetadataEntry, Stream, LAST_MODIFIED};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use tracing::debug;

/// Built-in schemas keyed by schema file stem, in sync order
pub static BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    ("site_stream", include_str!("../../schemas/site_stream.json")),
    (
        "customer_stream",
        include_str!("../../schemas/customer_stream.json"),
    ),
    (
        "project_stream",
        include_str!("../../schemas/project_stream.json"),
    ),
    ("skill_stream", include_str!("../../schemas/skill_stream.json")),
    ("users_stream", include_str!("../../schemas/users_stream.json")),
    (
        "work-item_stream",
        include_str!("../../schemas/work-item_stream.json"),
    ),
    (
        "work-item-history_stream",
        include_str!("../../schemas/work-item-history_stream.json"),
    ),
    (
        "activity_stream",
        include_str!("../../schemas/activity_stream.json"),
    ),
    (
        "appointment_stream",
        include_str!("../../schemas/appointment_stream.json"),
    ),
];

/// Build the catalog, marking streams of the given datasources selected.
///
/// Every built-in stream is listed; with no datasources nothing is selected.
pub fn discover(selected_datasources: &[String]) -> Result<Catalog> {
    let mut streams = Vec::with_capacity(BUILTIN_SCHEMAS.len());

    for (file_stem, raw) in BUILTIN_SCHEMAS {
        let schema: JsonValue = serde_json::from_str(raw)
            .map_err(|e| Error::catalog(format!("Invalid schema {file_stem}: {e}")))?;
        let datasource = extract_datasource(file_stem).ok_or_else(|| {
            Error::catalog(format!("Schema {file_stem} does not name a datasource"))
        })?;

        let tap_stream_id = file_stem.replace('-', "");
        let mut stream = Stream::new(
            tap_stream_id,
            datasource.replace('-', ""),
            Some(datasource.to_string()),
            schema,
        );
        stream.key_properties = key_properties(datasource);
        if let Some(key) = replication_key(datasource) {
            stream.replication_key = Some(key.to_string());
            stream.replication_method = Some(ReplicationMethod::Incremental);
        } else {
            stream.replication_method = Some(ReplicationMethod::FullTable);
        }

        let selected = selected_datasources.iter().any(|d| d == datasource);
        stream.metadata = vec![root_metadata(&stream, selected)];

        debug!(
            stream = %stream.tap_stream_id,
            selected,
            "Discovered stream"
        );
        streams.push(stream);
    }

    Ok(Catalog::new(streams))
}

/// Datasource portion of a stream id: everything before the last `_stream`
pub fn extract_datasource(stream_id: &str) -> Option<&str> {
    let idx = stream_id.to_ascii_lowercase().rfind("_stream")?;
    Some(&stream_id[..idx])
}

fn key_properties(datasource: &str) -> Vec<String> {
    let key = match datasource {
        "users" => "userId",
        "work-item-history" => "workItemHistoryId",
        "activity" => "activityId",
        "appointment" => "appointmentId",
        _ => "reference",
    };
    vec![key.to_string()]
}

fn replication_key(datasource: &str) -> Option<&'static str> {
    match datasource {
        "work-item" | "work-item-history" => Some(LAST_MODIFIED),
        _ => None,
    }
}

fn root_metadata(stream: &Stream, selected: bool) -> MetadataEntry {
    let method = stream
        .replication_method
        .unwrap_or_default()
        .as_str()
        .to_string();
    let valid_keys: Vec<JsonValue> = stream
        .replication_key()
        .map(|k| JsonValue::String(k.to_string()))
        .into_iter()
        .collect();

    let mut metadata = JsonObject::new();
    metadata.insert("selected".to_string(), JsonValue::Bool(selected));
    metadata.insert(
        "table-key-properties".to_string(),
        JsonValue::from(stream.key_properties.clone()),
    );
    metadata.insert(
        "forced-replication-method".to_string(),
        JsonValue::String(method),
    );
    metadata.insert(
        "valid-replication-keys".to_string(),
        JsonValue::Array(valid_keys),
    );
    MetadataEntry::root(metadata)
}
