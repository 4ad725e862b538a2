//! Record flattening
//!
//! Nested objects collapse into a single level keyed by the underscore-joined
//! path of their ancestors. Arrays are leaves and are kept intact.

use crate::types::{JsonObject, JsonValue};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '_';

/// Flatten a JSON object into a single-level record.
///
/// The first character of every key segment is lower-cased, so `Customer.Id`
/// becomes `customer_id`. Null leaves are preserved; empty nested objects
/// contribute no keys.
pub fn flatten(value: &JsonObject) -> JsonObject {
    let mut out = JsonObject::new();
    flatten_into(&mut out, value, None);
    out
}

fn flatten_into(out: &mut JsonObject, obj: &JsonObject, prefix: Option<&str>) {
    for (key, value) in obj {
        let segment = lower_first(key);
        let path = match prefix {
            Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{segment}"),
            None => segment,
        };

        match value {
            JsonValue::Object(nested) => flatten_into(out, nested, Some(&path)),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
