//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, BTreeMap<String, JsonValue>>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bookmark value
    pub fn get_bookmark(&self, stream: &str, key: &str) -> Option<&JsonValue> {
        self.bookmarks.get(stream)?.get(key)
    }

    /// Get a bookmark value as a string
    pub fn get_bookmark_str(&self, stream: &str, key: &str) -> Option<&str> {
        self.get_bookmark(stream, key)?.as_str()
    }

    /// Set a bookmark value
    pub fn set_bookmark(&mut self, stream: &str, key: &str, value: impl Into<JsonValue>) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Copy of this state with one bookmark replaced
    #[must_use]
    pub fn with_bookmark(&self, stream: &str, key: &str, value: impl Into<JsonValue>) -> Self {
        let mut next = self.clone();
        next.set_bookmark(stream, key, value);
        next
    }
}
