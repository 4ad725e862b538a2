//! State management module
//!
//! Tracks replication bookmarks so re-runs resume instead of restarting.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - flat bookmark map, `{state_key: value}`
//! - `StateManager` - run-scoped owner of the map, with optional
//!   persistence after every checkpoint

mod manager;
mod types;

pub use manager::StateManager;
pub use types::State;
