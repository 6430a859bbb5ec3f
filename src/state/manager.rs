//! State manager implementation
//!
//! Loads the previous run's state and accepts one commit per finished
//! stream. Streams never write here themselves: they emit a state message
//! and the engine commits it once the stream has been fully drained.

use super::types::State;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// State manager for loading, committing and persisting state
#[derive(Debug, Default)]
pub struct StateManager {
    /// Current state
    state: State,
    /// Streams that have committed in this run
    committed: BTreeSet<String>,
}

impl StateManager {
    /// Create an in-memory state manager with empty state
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create a state manager around an existing state
    pub fn with_state(state: State) -> Self {
        Self {
            state,
            committed: BTreeSet::new(),
        }
    }

    /// Create a state manager from a file, loading existing state if present
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
        Ok(Self::with_state(state))
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> State {
        self.state.clone()
    }

    /// Get a bookmark value as a string
    pub fn get_bookmark(&self, stream: &str, key: &str) -> Option<&str> {
        self.state.get_bookmark_str(stream, key)
    }

    /// Commit a finished stream's bookmarks.
    ///
    /// Only the bookmarks of `stream` are taken from `next`. A stream commits
    /// at most once per run.
    pub fn commit(&mut self, stream: &str, next: &State) -> Result<()> {
        if !self.committed.insert(stream.to_string()) {
            return Err(Error::state(format!(
                "Stream '{stream}' already committed its bookmark in this run"
            )));
        }

        match next.bookmarks.get(stream) {
            Some(bookmarks) => {
                debug!(stream, ?bookmarks, "Committing bookmarks");
                self.state
                    .bookmarks
                    .insert(stream.to_string(), bookmarks.clone());
            }
            None => debug!(stream, "No bookmarks to commit"),
        }

        Ok(())
    }

    /// Whether a stream has committed in this run
    pub fn is_committed(&self, stream: &str) -> bool {
        self.committed.contains(stream)
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Save state to a file
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }
}
