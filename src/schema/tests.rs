//! Schema and discovery tests

use super::*;
use crate::catalog::{Catalog, FieldSelection, Inclusion};
use crate::streams::{descriptor, STREAMS};

#[test]
fn test_every_stream_has_a_schema() {
    for d in STREAMS {
        let schema = load_schema(d.name).unwrap();
        let props = property_names(&schema);
        for key in d.key_properties {
            assert!(
                props.iter().any(|p| p == key),
                "{} schema lacks key property {key}",
                d.name
            );
        }
    }
}

#[test]
fn test_unknown_schema() {
    assert!(get_schema("reels").is_none());
    assert!(load_schema("reels").is_err());
}

#[test]
fn test_discover_order_and_keys() {
    let catalog = discover().unwrap();
    let names: Vec<&str> = catalog.streams.iter().map(|s| s.stream.as_str()).collect();
    let expected: Vec<&str> = STREAMS.iter().map(|d| d.name).collect();
    assert_eq!(names, expected);

    let user_insights = catalog.get("user_insights").unwrap();
    assert_eq!(user_insights.replication_key.as_deref(), Some("date"));
    assert_eq!(
        user_insights.key_properties,
        vec!["business_account_id", "date"]
    );
    assert!(user_insights.is_selected());
}

#[test]
fn test_discover_metadata() {
    let entry = catalog_entry(descriptor("media").unwrap()).unwrap();

    let root = entry.root_metadata().unwrap();
    assert_eq!(root.table_key_properties, Some(vec!["id".to_string()]));
    assert!(root.valid_replication_keys.is_none());

    let id = entry
        .metadata
        .iter()
        .find(|m| m.property_name() == Some("id"))
        .unwrap();
    assert_eq!(id.metadata.inclusion, Some(Inclusion::Automatic));

    let caption = entry
        .metadata
        .iter()
        .find(|m| m.property_name() == Some("caption"))
        .unwrap();
    assert_eq!(caption.metadata.inclusion, Some(Inclusion::Available));
}

#[test]
fn test_discovered_selection_excludes_base_properties() {
    let entry = catalog_entry(descriptor("media").unwrap()).unwrap();
    let fields =
        FieldSelection::from_metadata(&entry.metadata, descriptor("media").unwrap().base_properties)
            .request_fields();

    assert!(fields.contains("caption"));
    assert!(fields.contains("id"));
    assert!(!fields.contains("page_id"));
    assert!(!fields.contains("business_account_id"));
}

#[test]
fn test_catalog_round_trip() {
    let catalog = discover().unwrap();
    let json = serde_json::to_string(&catalog).unwrap();
    let parsed = Catalog::from_json(&json).unwrap();

    assert_eq!(parsed.streams.len(), 7);
    assert_eq!(
        parsed.get("users").unwrap().metadata,
        catalog.get("users").unwrap().metadata
    );
    assert!(json.contains("\"replication-key\":\"date\""));
    assert!(json.contains("\"table-key-properties\""));
}
