//! State management module
//!
//! Tracks one bookmark per (stream, facility): the latest updated time of
//! any record already emitted. Bookmarks only move forward and are persisted
//! between runs so each run only emits what changed.
//!
//! # Overview
//!
//! The state module provides:
//! - `BookmarkStore` - The get/set interface the sync engine depends on
//! - `State` - Serializable bookmark map
//! - `StateManager` - File-backed `BookmarkStore` with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{BookmarkStore, State, StreamState};

#[cfg(test)]
mod manager_tests;
