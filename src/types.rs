//! Common types used throughout the Instagram source
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication Method
// ============================================================================

/// How a stream is replicated between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Every run re-reads everything
    #[default]
    FullTable,
    /// Runs resume from a bookmark
    Incremental,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Account
// ============================================================================

/// An Instagram business account reachable through a Facebook page
///
/// Supplied by the API client and immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Facebook page the business account is attached to
    pub page_id: String,
    /// Instagram business account id
    pub business_account_id: String,
}

impl Account {
    /// Create a new account
    pub fn new(page_id: impl Into<String>, business_account_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            business_account_id: business_account_id.into(),
        }
    }
}
