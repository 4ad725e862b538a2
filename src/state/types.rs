//! State types for tracking sync progress
//!
//! Serialized as a plain JSON object and persisted between runs.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookmark map keyed by state key (a stream id, or stream id plus filter)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    bookmarks: BTreeMap<String, JsonValue>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a state key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.bookmarks.get(key)
    }

    /// Set the bookmark for a state key
    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.bookmarks.insert(key.into(), value);
    }

    /// Whether a bookmark exists for the key
    pub fn contains(&self, key: &str) -> bool {
        self.bookmarks.contains_key(key)
    }

    /// Number of bookmarks
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    /// Whether there are no bookmarks
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// The map as a JSON value, as carried by STATE messages
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(
            self.bookmarks
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
