//! Stream schemas and discovery
//!
//! The JSON Schema of every stream is embedded in the binary, so
//! `discover` works offline and always matches the records the streams
//! produce.
//!
//! # Overview
//!
//! The schema module provides:
//! - `get_schema` - Embedded schema text by stream name
//! - `load_schema` - Parsed schema by stream name
//! - `discover` - A Singer catalog covering every stream

mod discover;

pub use discover::{catalog_entry, discover};

use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Embedded schema documents by stream name
pub static BUILTIN_SCHEMAS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // Account level
        m.insert("users", include_str!("../../schemas/users.json"));
        m.insert(
            "user_lifetime_insights",
            include_str!("../../schemas/user_lifetime_insights.json"),
        );
        m.insert(
            "user_insights",
            include_str!("../../schemas/user_insights.json"),
        );

        // Media and stories
        m.insert("media", include_str!("../../schemas/media.json"));
        m.insert(
            "media_insights",
            include_str!("../../schemas/media_insights.json"),
        );
        m.insert("stories", include_str!("../../schemas/stories.json"));
        m.insert(
            "story_insights",
            include_str!("../../schemas/story_insights.json"),
        );

        m
    });

/// Get the embedded schema text of a stream
pub fn get_schema(stream: &str) -> Option<&'static str> {
    BUILTIN_SCHEMAS.get(stream).copied()
}

/// Parse the embedded schema of a stream
pub fn load_schema(stream: &str) -> Result<JsonValue> {
    let text = get_schema(stream).ok_or_else(|| Error::stream_not_found(stream))?;
    serde_json::from_str(text)
        .map_err(|e| Error::config(format!("Invalid schema for stream '{stream}': {e}")))
}

/// Top-level property names of a schema, sorted
pub fn property_names(schema: &JsonValue) -> Vec<String> {
    schema
        .get("properties")
        .and_then(JsonValue::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
