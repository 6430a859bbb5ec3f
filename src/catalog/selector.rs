//! Field selector
//!
//! Turns breadcrumb metadata into the set of fields a stream asks the
//! Graph API for. Fields the stream synthesizes itself (join keys such as
//! `page_id`) are never requested: they belong to a different entity.

use super::types::{Inclusion, MetadataEntry};
use std::collections::BTreeSet;

/// Fields of one stream, split by how they were included
///
/// Built once when the stream is constructed and never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    automatic: BTreeSet<String>,
    selected: BTreeSet<String>,
}

impl FieldSelection {
    /// Build the selection from catalog metadata.
    ///
    /// Fields selected or automatic in `metadata` are kept, minus
    /// `base_properties`. Entries whose breadcrumb is not exactly two
    /// elements long describe the stream root or nested properties and are
    /// ignored.
    pub fn from_metadata(metadata: &[MetadataEntry], base_properties: &[&str]) -> Self {
        let mut selection = Self::default();

        for entry in metadata {
            let Some(name) = entry.property_name() else {
                continue;
            };
            if base_properties.contains(&name) || !entry.metadata.is_included() {
                continue;
            }

            if entry.metadata.inclusion == Some(Inclusion::Automatic) {
                selection.automatic.insert(name.to_string());
            } else {
                selection.selected.insert(name.to_string());
            }
        }

        selection
    }

    /// Build a selection from explicit field names (all user-selected)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            automatic: BTreeSet::new(),
            selected: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Fields included regardless of selection
    pub fn automatic(&self) -> &BTreeSet<String> {
        &self.automatic
    }

    /// Fields the user opted into
    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Everything to request upstream
    pub fn request_fields(&self) -> BTreeSet<String> {
        self.automatic.union(&self.selected).cloned().collect()
    }

    /// Whether a field will be requested
    pub fn contains(&self, field: &str) -> bool {
        self.automatic.contains(field) || self.selected.contains(field)
    }

    /// Request fields minus the given ones, as a list
    pub fn request_fields_without(&self, excluded: &[&str]) -> Vec<String> {
        self.request_fields()
            .into_iter()
            .filter(|f| !excluded.contains(&f.as_str()))
            .collect()
    }
}
