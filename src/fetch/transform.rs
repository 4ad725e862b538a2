//! Reshape non-datasource responses into pages
//!
//! Search, activity, appointment and history responses each have their own
//! layout; these functions turn them into the `{continuationToken, rows}`
//! shape so one sync loop handles every stream.

use super::types::{Page, Row};
use crate::flatten::flatten;
use crate::types::{JsonObject, JsonValue};
use tracing::warn;

const FIELD_VALUES: &str = "fieldValues";
const PROPERTIES: &str = "properties";

/// Work-item search response (`{continuationToken, items}`)
pub fn search_page(response: JsonValue) -> Option<Page> {
    list_page(response, "items", true)
}

/// Appointment search response (`{continuationToken, appointments}`)
pub fn appointment_page(response: JsonValue) -> Option<Page> {
    list_page(response, "appointments", false)
}

/// Activity response: a bare array of activities
pub fn activity_page(response: JsonValue) -> Option<Page> {
    let JsonValue::Array(items) = response else {
        warn!("Discarding activity response that is not an array");
        return None;
    };

    let rows = items
        .into_iter()
        .filter_map(into_object)
        .map(|item| Row::new(rename_field_values(item)))
        .collect();
    Some(Page::new(rows, None))
}

/// History response: one row per stage.
///
/// Each row carries the work item's own fields, the stage flattened under
/// `stage_`, and `workItemHistoryId` = `{workItemId}_{index}`.
pub fn history_page(response: JsonValue, work_item_id: &str) -> Option<Page> {
    let JsonValue::Object(mut history) = response else {
        warn!("Discarding history response that is not an object");
        return None;
    };

    let stages = match history.remove("stages") {
        Some(JsonValue::Array(stages)) => stages,
        _ => return Some(Page::default()),
    };

    let id = history
        .get("workItemId")
        .and_then(JsonValue::as_str)
        .unwrap_or(work_item_id)
        .to_string();

    let rows = stages
        .into_iter()
        .enumerate()
        .map(|(index, stage)| {
            let mut row = JsonObject::new();
            row.insert(
                "workItemHistoryId".to_string(),
                JsonValue::String(format!("{id}_{index}")),
            );
            row.extend(history.clone());

            let mut wrapped = JsonObject::new();
            wrapped.insert("stage".to_string(), stage);
            row.extend(flatten(&wrapped));

            Row::new(row)
        })
        .collect();
    Some(Page::new(rows, None))
}

fn list_page(response: JsonValue, field: &str, rename: bool) -> Option<Page> {
    let JsonValue::Object(mut body) = response else {
        warn!("Discarding response that is not an object");
        return None;
    };

    let continuation_token = body
        .get("continuationToken")
        .and_then(JsonValue::as_str)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string);

    let items = match body.remove(field) {
        Some(JsonValue::Array(items)) => items,
        _ => Vec::new(),
    };

    let rows = items
        .into_iter()
        .filter_map(into_object)
        .map(|item| {
            if rename {
                Row::new(rename_field_values(item))
            } else {
                Row::new(item)
            }
        })
        .collect();
    Some(Page::new(rows, continuation_token))
}

fn into_object(value: JsonValue) -> Option<JsonObject> {
    match value {
        JsonValue::Object(obj) => Some(obj),
        _ => None,
    }
}

/// Promote a non-empty `fieldValues` container to `properties`
fn rename_field_values(mut item: JsonObject) -> JsonObject {
    let non_empty = item
        .get(FIELD_VALUES)
        .and_then(JsonValue::as_object)
        .is_some_and(|values| !values.is_empty());
    if non_empty {
        if let Some(values) = item.remove(FIELD_VALUES) {
            item.insert(PROPERTIES.to_string(), values);
        }
    }
    item
}
