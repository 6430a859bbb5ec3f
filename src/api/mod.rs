//! Graph API access
//!
//! The streams only ever talk to [`InstagramApi`], a narrow capability
//! interface returning plain JSON records and continuation tokens. The
//! production implementation is [`GraphClient`].
//!
//! # Features
//!
//! - **No hidden retries**: failures come back as `ApiError` for the retry policy
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Pagination**: `after` cursors surfaced as `Page::next`

mod client;
mod rate_limit;
mod types;

pub use client::GraphClient;
pub use rate_limit::RateLimiter;
pub use types::{InsightMetric, InsightQuery, InsightValue, Page, Period};

use crate::error::Result;
use crate::types::{Account, JsonObject};
use async_trait::async_trait;

/// Capabilities the streams need from the upstream API
#[async_trait]
pub trait InstagramApi: Send + Sync {
    /// Facebook pages with an attached Instagram business account
    async fn enumerate_accounts(&self, after: Option<String>) -> Result<Page<Account>>;

    /// Profile fields of a business account
    async fn get_profile(&self, account_id: &str, fields: &[String]) -> Result<JsonObject>;

    /// Media of a business account, newest first
    async fn get_media(
        &self,
        account_id: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>>;

    /// A single media object, e.g. a carousel child
    async fn get_media_item(&self, media_id: &str, fields: &[String]) -> Result<JsonObject>;

    /// Insights of an account, media or story
    async fn get_insights(&self, object_id: &str, query: &InsightQuery)
        -> Result<Vec<InsightMetric>>;

    /// Live stories of a business account
    async fn get_stories(
        &self,
        account_id: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>>;
}

#[cfg(test)]
pub(crate) mod fake;
