//! Engine types
//!
//! Message types and run statistics for the sync engine.

use crate::state::State;
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One output record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: JsonObject,
        /// When the record was extracted
        time_extracted: DateTime<Utc>,
    },
    /// Bookmark snapshot, always the last message of an incremental stream
    State(State),
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonObject, time_extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a state message
    pub fn state(state: State) -> Self {
        Self::State(state)
    }

    /// Singer JSON line for this message
    pub fn to_singer(&self) -> JsonValue {
        match self {
            Self::Record {
                stream,
                record,
                time_extracted,
            } => json!({
                "type": "RECORD",
                "stream": stream,
                "record": record,
                "time_extracted": time_extracted.to_rfc3339_opts(SecondsFormat::Micros, true),
            }),
            Self::State(state) => json!({
                "type": "STATE",
                "value": state,
            }),
        }
    }

    /// Singer SCHEMA line for a stream
    pub fn schema_line(
        stream: &str,
        schema: &JsonValue,
        key_properties: &[String],
        replication_key: Option<&str>,
    ) -> JsonValue {
        let mut line = json!({
            "type": "SCHEMA",
            "stream": stream,
            "schema": schema,
            "key_properties": key_properties,
        });
        if let Some(key) = replication_key {
            line["bookmark_properties"] = json!([key]);
        }
        line
    }

    /// Stream of a record message
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Record { stream, .. } => Some(stream),
            Self::State(_) => None,
        }
    }

    /// Record payload, if this is a record
    pub fn as_record(&self) -> Option<&JsonObject> {
        match self {
            Self::Record { record, .. } => Some(record),
            Self::State(_) => None,
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Streams deselected in the catalog
    pub streams_skipped: usize,
    /// Expected-empty conditions that skipped an account or item
    pub expected_empty: usize,
    /// Retries performed by the retry policy
    pub retries: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a deselected stream
    pub fn add_skipped_stream(&mut self) {
        self.streams_skipped += 1;
    }

    /// Add expected-empty skips
    pub fn add_expected_empty(&mut self, count: usize) {
        self.expected_empty += count;
    }

    /// Set the retry count
    pub fn set_retries(&mut self, retries: u64) {
        self.retries = retries;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
