//! Catalog types
//!
//! Serialized in the Singer catalog shape so catalogs produced by
//! `discover` (or edited by hand) can be fed straight back into `read`.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Catalog of streams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams in the catalog
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog JSON: {e}")))
    }

    /// Parse a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to read catalog file: {e}")))?;
        Self::from_json(&content)
    }

    /// Find an entry by stream id
    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == tap_stream_id)
    }
}

/// One stream in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream id
    pub tap_stream_id: String,

    /// Stream name
    pub stream: String,

    /// Optional alias used by the loader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_alias: Option<String>,

    /// JSON schema of the records
    #[serde(default)]
    pub schema: JsonValue,

    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,

    /// Primary key columns
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Bookmark column for incremental streams
    #[serde(rename = "replication-key", default)]
    pub replication_key: Option<String>,
}

impl CatalogEntry {
    /// Root (stream-level) metadata, if present
    pub fn root_metadata(&self) -> Option<&FieldMetadata> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// A stream is synced unless its root metadata deselects it
    pub fn is_selected(&self) -> bool {
        self.root_metadata()
            .and_then(|m| m.selected)
            .unwrap_or(true)
    }
}

/// Metadata attached to one breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path to the property; empty for the stream itself
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// The metadata values
    #[serde(default)]
    pub metadata: FieldMetadata,
}

impl MetadataEntry {
    /// Metadata for a top-level property
    pub fn property(name: impl Into<String>, metadata: FieldMetadata) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.into()],
            metadata,
        }
    }

    /// Property name when this entry describes a top-level property
    pub fn property_name(&self) -> Option<&str> {
        match self.breadcrumb.as_slice() {
            [_, name] => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Inclusion of a property in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Always emitted, selection does not matter
    Automatic,
    /// Emitted when selected
    Available,
    /// Never emitted
    Unsupported,
}

/// Metadata values for a breadcrumb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// User selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    /// Inclusion rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    /// Primary key (root only)
    #[serde(
        rename = "table-key-properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub table_key_properties: Option<Vec<String>>,

    /// Replication keys (root only)
    #[serde(
        rename = "valid-replication-keys",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_replication_keys: Option<Vec<String>>,

    /// Replication method (root only)
    #[serde(
        rename = "forced-replication-method",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub forced_replication_method: Option<ReplicationMethod>,

    /// Anything else, kept for round-tripping
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl FieldMetadata {
    /// Whether this property ends up in the requested field set
    pub fn is_included(&self) -> bool {
        self.selected == Some(true) || self.inclusion == Some(Inclusion::Automatic)
    }
}
