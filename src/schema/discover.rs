//! Catalog discovery

use super::{load_schema, property_names};
use crate::catalog::{Catalog, CatalogEntry, FieldMetadata, Inclusion, MetadataEntry};
use crate::error::Result;
use crate::streams::{StreamDescriptor, STREAMS};
use crate::types::ReplicationMethod;

/// Build the catalog of every stream, in sync order
pub fn discover() -> Result<Catalog> {
    let streams = STREAMS
        .iter()
        .map(|descriptor| catalog_entry(descriptor))
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog { streams })
}

/// Catalog entry of one stream, with everything selected
pub fn catalog_entry(descriptor: &StreamDescriptor) -> Result<CatalogEntry> {
    let schema = load_schema(descriptor.name)?;
    let key_properties: Vec<String> = descriptor
        .key_properties
        .iter()
        .map(|k| k.to_string())
        .collect();
    let replication_key = descriptor.replication_key.map(String::from);

    let root = FieldMetadata {
        selected: Some(true),
        table_key_properties: Some(key_properties.clone()),
        valid_replication_keys: replication_key.clone().map(|k| vec![k]),
        forced_replication_method: Some(if descriptor.is_incremental() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        }),
        ..FieldMetadata::default()
    };

    let mut metadata = vec![MetadataEntry {
        breadcrumb: Vec::new(),
        metadata: root,
    }];

    for name in property_names(&schema) {
        let automatic = key_properties.contains(&name) || replication_key.as_ref() == Some(&name);
        let inclusion = if automatic {
            Inclusion::Automatic
        } else {
            Inclusion::Available
        };
        metadata.push(MetadataEntry::property(
            name,
            FieldMetadata {
                selected: Some(true),
                inclusion: Some(inclusion),
                ..FieldMetadata::default()
            },
        ));
    }

    Ok(CatalogEntry {
        tap_stream_id: descriptor.name.to_string(),
        stream: descriptor.name.to_string(),
        stream_alias: None,
        schema,
        metadata,
        key_properties,
        replication_key,
    })
}
