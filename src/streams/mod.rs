//! Streams module
//!
//! One stream per entity type. Each stream turns its field selection into
//! upstream calls, gates every call through the retry policy, and returns
//! the ordered messages of one run.
//!
//! # Overview
//!
//! The streams module provides:
//! - `Stream` - The per-entity read protocol
//! - `StreamDescriptor` - Static keys and base properties of a stream
//! - `StreamContext` - What a stream may touch during a run
//! - `build` - Stream construction from a catalog entry
//!
//! # Example
//!
//! ```ignore
//! let stream = streams::build(catalog_entry)?;
//! let ctx = StreamContext::new(&client, &retry, &state);
//! let messages = stream.read(&ctx).await?;
//! ```

mod context;
pub mod media;
pub mod media_insights;
pub mod stories;
pub mod story_insights;
pub mod user_insights;
pub mod user_lifetime_insights;
pub mod users;

pub use context::StreamContext;

use crate::catalog::{CatalogEntry, FieldSelection};
use crate::engine::Message;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Static properties of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Stream name, also its catalog id
    pub name: &'static str,
    /// Primary key columns
    pub key_properties: &'static [&'static str],
    /// Bookmark column for incremental streams
    pub replication_key: Option<&'static str>,
    /// Columns the stream fills in itself and never requests upstream
    pub base_properties: &'static [&'static str],
}

impl StreamDescriptor {
    /// Check if the stream replicates incrementally
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some()
    }
}

/// All streams, in sync order
pub static STREAMS: [&StreamDescriptor; 7] = [
    &users::DESCRIPTOR,
    &user_lifetime_insights::DESCRIPTOR,
    &user_insights::DESCRIPTOR,
    &media::DESCRIPTOR,
    &media_insights::DESCRIPTOR,
    &stories::DESCRIPTOR,
    &story_insights::DESCRIPTOR,
];

/// Look up a stream by name
pub fn descriptor(name: &str) -> Option<&'static StreamDescriptor> {
    STREAMS.iter().copied().find(|d| d.name == name)
}

/// Position of a stream in sync order
pub fn sync_position(name: &str) -> Option<usize> {
    STREAMS.iter().position(|d| d.name == name)
}

/// A readable entity stream
#[async_trait]
pub trait Stream: Send + Sync {
    /// Static stream properties
    fn descriptor(&self) -> &'static StreamDescriptor;

    /// Stream name
    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Read every account and return the run's messages in emission order.
    ///
    /// Incremental streams end with exactly one state message.
    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>>;
}

/// Build the stream a catalog entry describes
pub fn build(entry: &CatalogEntry) -> Result<Box<dyn Stream>> {
    let descriptor = descriptor(&entry.tap_stream_id)
        .ok_or_else(|| Error::stream_not_found(&entry.tap_stream_id))?;
    let fields = FieldSelection::from_metadata(&entry.metadata, descriptor.base_properties);

    let stream: Box<dyn Stream> = match descriptor.name {
        users::NAME => Box::new(users::Users::new(fields)),
        user_lifetime_insights::NAME => {
            Box::new(user_lifetime_insights::UserLifetimeInsights::new())
        }
        user_insights::NAME => Box::new(user_insights::UserInsights::new()),
        media::NAME => Box::new(media::Media::new(fields)),
        media_insights::NAME => Box::new(media_insights::MediaInsights::new()),
        stories::NAME => Box::new(stories::Stories::new(fields)),
        story_insights::NAME => Box::new(story_insights::StoryInsights::new()),
        other => return Err(Error::stream_not_found(other)),
    };

    Ok(stream)
}
