//! Catalog module
//!
//! Singer catalog types and the field selector.
//!
//! # Overview
//!
//! The catalog module provides:
//! - `Catalog` / `CatalogEntry` - The catalog handed to `read`
//! - `MetadataEntry` - Typed breadcrumb metadata
//! - `FieldSelection` - Fields a stream requests upstream, built once per stream
//! - `selected_fields` - The plain set-valued selector

mod selector;
mod types;

pub use selector::FieldSelection;
pub use types::{Catalog, CatalogEntry, FieldMetadata, Inclusion, MetadataEntry};
