//! Source configuration
//!
//! The JSON config handed to the source on the command line. Only
//! `access_token` is required; everything else has a documented default.

use crate::error::{Error, Result};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Source Config
// ============================================================================

/// Complete source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Graph API access token
    #[serde(default)]
    pub access_token: String,

    /// Graph API host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Graph API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Page size for paged edges
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// How far back insight history is requested
    #[serde(default = "default_buffer_days")]
    pub buffer_days: u32,

    /// Days insight data needs to be finalized
    #[serde(default = "default_latency_offset_days")]
    pub latency_offset_days: u32,

    /// Client-side request rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry: BackoffConfig,

    /// Query parameters removed from media and profile picture URLs
    #[serde(default = "default_strip_url_params")]
    pub strip_url_params: Vec<String>,
}

fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v19.0".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_buffer_days() -> u32 {
    30
}

fn default_latency_offset_days() -> u32 {
    1
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_timeout() -> u64 {
    60
}

fn default_strip_url_params() -> Vec<String> {
    ["_nc_rid", "_nc_sid", "_nc_ohc", "oh", "oe"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: default_base_url(),
            api_version: default_api_version(),
            page_size: default_page_size(),
            buffer_days: default_buffer_days(),
            latency_offset_days: default_latency_offset_days(),
            requests_per_second: default_requests_per_second(),
            timeout_seconds: default_timeout(),
            retry: BackoffConfig::default(),
            strip_url_params: default_strip_url_params(),
        }
    }
}

impl SourceConfig {
    /// Create a config with the given token and defaults for everything else
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        Self::from_json(&content)
    }

    /// Reject configs the source cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::missing_field("access_token"));
        }
        if self.buffer_days == 0 {
            return Err(Error::invalid_value("buffer_days", "must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_value(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Versioned API root, e.g. `https://graph.facebook.com/v19.0`
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// HTTP timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// ============================================================================
// Backoff Config
// ============================================================================

/// Backoff configuration for retryable upstream errors
///
/// Delays are deterministic: no jitter is ever applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_initial_ms() -> u64 {
    5000
}

fn default_max_ms() -> u64 {
    300_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_attempts() -> u32 {
    5
}

impl BackoffConfig {
    /// Constant delay between attempts
    pub fn constant(delay: Duration, max_attempts: u32) -> Self {
        Self {
            backoff_type: BackoffType::Constant,
            initial_ms: delay.as_millis() as u64,
            max_ms: delay.as_millis() as u64,
            multiplier: 1.0,
            max_attempts,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let step = attempt.saturating_sub(1);
        let delay_ms = match self.backoff_type {
            BackoffType::Constant => self.initial_ms as f64,
            BackoffType::Linear => self.initial_ms as f64 * f64::from(step + 1),
            BackoffType::Exponential => {
                self.initial_ms as f64 * self.multiplier.powi(step.min(63) as i32)
            }
        };

        let capped = delay_ms.min(self.max_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}
