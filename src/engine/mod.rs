//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Runs selected streams one at a time and owns the state store
//! - `plan_streams` - Turns a catalog into the ordered list of streams to sync
//! - Message types for output (Record, State)
//!
//! Streams run strictly one after another. A stream's bookmark is committed
//! only after the stream returned successfully, so a fatal error never
//! leaves a half-read window behind in the state.

mod types;

pub use types::{Message, SyncStats};

use crate::api::InstagramApi;
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::state::{StateManager, WindowPolicy};
use crate::streams::{self, Stream, StreamContext};
use crate::types::JsonValue;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, error, info};

/// A stream picked from the catalog, ready to run
pub struct PlannedStream {
    /// The catalog entry it was built from
    pub entry: CatalogEntry,
    /// The stream itself
    pub stream: Box<dyn Stream>,
}

impl std::fmt::Debug for PlannedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannedStream")
            .field("stream", &self.stream.name())
            .finish_non_exhaustive()
    }
}

/// Selected streams of a catalog in sync order.
///
/// Every entry must name a known stream, selected or not.
pub fn plan_streams(catalog: &Catalog) -> Result<Vec<PlannedStream>> {
    let mut planned = Vec::new();

    for entry in &catalog.streams {
        let stream = streams::build(entry)?;
        if !entry.is_selected() {
            debug!(stream = %entry.tap_stream_id, "Stream not selected, skipping");
            continue;
        }
        planned.push(PlannedStream {
            entry: entry.clone(),
            stream,
        });
    }

    planned.sort_by_key(|p| streams::sync_position(p.stream.name()));
    Ok(planned)
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// Upstream API
    api: Box<dyn InstagramApi>,
    /// Retry policy shared by all streams
    retry: RetryPolicy,
    /// State manager
    state: StateManager,
    /// Incremental window limits
    window: WindowPolicy,
    /// Query keys stripped from URLs
    strip_url_params: Vec<String>,
    /// Fixed date for window computation, today when unset
    today: Option<NaiveDate>,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine with default policies
    pub fn new(api: Box<dyn InstagramApi>, state: StateManager) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            state,
            window: WindowPolicy::default(),
            strip_url_params: Vec::new(),
            today: None,
            stats: SyncStats::default(),
        }
    }

    /// Create an engine with the policies from a source config
    pub fn from_config(
        config: &SourceConfig,
        api: Box<dyn InstagramApi>,
        state: StateManager,
    ) -> Self {
        Self::new(api, state)
            .with_retry(RetryPolicy::new(config.retry.clone()))
            .with_window(WindowPolicy {
                buffer_days: config.buffer_days,
                latency_offset_days: config.latency_offset_days,
            })
            .with_strip_url_params(config.strip_url_params.clone())
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set window limits
    #[must_use]
    pub fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    /// Set the URL query keys to strip
    #[must_use]
    pub fn with_strip_url_params(mut self, keys: Vec<String>) -> Self {
        self.strip_url_params = keys;
        self
    }

    /// Compute windows against a fixed date instead of today
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get mutable state manager
    pub fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Read one stream and commit its bookmark.
    ///
    /// Returns the stream's messages; for incremental streams the last one
    /// is the committed state.
    pub async fn sync_stream(&mut self, stream: &dyn Stream) -> Result<Vec<Message>> {
        let name = stream.name();
        let descriptor = stream.descriptor();
        info!(stream = name, "Starting sync");

        let snapshot = self.state.snapshot();
        let mut ctx = StreamContext::new(self.api.as_ref(), &self.retry, &snapshot)
            .with_window(self.window)
            .with_strip_url_params(&self.strip_url_params);
        if let Some(today) = self.today {
            ctx = ctx.with_today(today);
        }

        let messages = stream.read(&ctx).await?;
        let expected_empty = ctx.expected_empty_count();
        drop(ctx);

        let state_positions: Vec<usize> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_state())
            .map(|(i, _)| i)
            .collect();

        match (descriptor.is_incremental(), state_positions.as_slice()) {
            (true, [last]) if *last + 1 == messages.len() => {}
            (false, []) => {}
            (true, _) => {
                return Err(Error::invalid_message(format!(
                    "stream '{name}' must end with exactly one state message"
                )));
            }
            (false, _) => {
                return Err(Error::invalid_message(format!(
                    "stream '{name}' is not incremental but emitted state"
                )));
            }
        }

        if let Some(Message::State(next)) = messages.last() {
            self.state.commit(name, next)?;
        }

        let records = messages.iter().filter(|m| m.is_record()).count();
        self.stats.add_records(records);
        self.stats.add_expected_empty(expected_empty);
        self.stats.add_stream();
        info!(stream = name, records, expected_empty, "Finished sync");

        Ok(messages)
    }

    /// Sync every selected stream of a catalog.
    ///
    /// Each Singer line is handed to `emit` as soon as its stream finished:
    /// the schema, the records, then the full state if the stream committed
    /// a bookmark.
    pub async fn run<F>(&mut self, catalog: &Catalog, mut emit: F) -> Result<()>
    where
        F: FnMut(JsonValue) -> Result<()>,
    {
        let start = Instant::now();
        let planned = plan_streams(catalog)?;
        let skipped = catalog.streams.len() - planned.len();
        for _ in 0..skipped {
            self.stats.add_skipped_stream();
        }

        info!(
            streams = planned.len(),
            skipped,
            state = %self.state.to_json()?,
            "Starting sync run"
        );

        for PlannedStream { entry, stream } in &planned {
            let messages = match self.sync_stream(stream.as_ref()).await {
                Ok(messages) => messages,
                Err(e) => {
                    let upstream = e.api_error();
                    error!(
                        stream = stream.name(),
                        verdict = ?e.verdict(),
                        code = ?upstream.and_then(|a| a.code),
                        subcode = ?upstream.and_then(|a| a.error_subcode),
                        "Stream failed: {e}"
                    );
                    return Err(e);
                }
            };

            emit(Message::schema_line(
                stream.name(),
                &entry.schema,
                &entry.key_properties,
                stream.descriptor().replication_key,
            ))?;

            for message in &messages {
                match message {
                    Message::Record { .. } => emit(message.to_singer())?,
                    Message::State(_) => {
                        emit(Message::state(self.state.snapshot()).to_singer())?;
                    }
                }
            }
        }

        self.stats.set_retries(self.retry.retries());
        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            records = self.stats.records_synced,
            streams = self.stats.streams_synced,
            expected_empty = self.stats.expected_empty,
            retries = self.stats.retries,
            duration_ms = self.stats.duration_ms,
            "Sync run complete"
        );

        Ok(())
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("window", &self.window)
            .field("today", &self.today)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
