//! State manager implementation
//!
//! Owns the run's bookmark map and persists it with atomic writes.

use super::types::State;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Run-scoped owner of the bookmark map
#[derive(Debug, Default)]
pub struct StateManager {
    /// Current bookmarks
    state: State,
    /// File rewritten on every save, if any
    output_path: Option<PathBuf>,
}

impl StateManager {
    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create a state manager around an existing state
    pub fn from_state(state: State) -> Self {
        Self {
            state,
            output_path: None,
        }
    }

    /// Load state from a file; a missing file starts empty
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::in_memory());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        Self::from_json(&contents)
    }

    /// Create a state manager from inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::in_memory());
        }
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self::from_state(state))
    }

    /// Persist the state to `path` on every save
    #[must_use]
    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Bookmark for a state key
    pub fn bookmark(&self, key: &str) -> Option<&JsonValue> {
        self.state.get(key)
    }

    /// Advance the bookmark for a state key
    pub fn set_bookmark(&mut self, key: &str, value: JsonValue) {
        self.state.set(key, value);
    }

    /// Starting point for an incremental sync.
    ///
    /// Returns the stored bookmark, or seeds it with `start_date` when the key
    /// has none yet. The seeded value becomes part of the state.
    pub fn get_start(&mut self, key: &str, start_date: Option<&str>) -> Result<JsonValue> {
        if let Some(value) = self.state.get(key) {
            return Ok(value.clone());
        }

        let start = start_date
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::missing_field("start_date"))?;
        let value = JsonValue::String(start.to_string());
        self.state.set(key, value.clone());
        Ok(value)
    }

    /// Write the state to the output path, if one is set
    pub async fn save(&self) -> Result<()> {
        let Some(path) = self.output_path.as_deref() else {
            return Ok(());
        };
        self.save_to_file(path).await
    }

    /// Save state to a specific file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = self.to_json_pretty()?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// File the state is persisted to, if any
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.output_path.is_none()
    }
}
