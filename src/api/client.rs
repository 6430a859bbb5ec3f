//! Graph API client
//!
//! A thin reqwest wrapper that:
//! - Authenticates every call with the access token
//! - Waits on the rate limiter before each request
//! - Turns error responses into [`ApiError`] for classification
//!
//! It never retries on its own; that is the retry policy's job.

use super::rate_limit::RateLimiter;
use super::types::{InsightMetric, InsightQuery, Page};
use super::InstagramApi;
use crate::config::SourceConfig;
use crate::error::{ApiError, Error, Result};
use crate::types::{Account, JsonObject, JsonValue};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Raw paged response
#[derive(Debug, Deserialize)]
struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default)]
    cursors: Option<Cursors>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Cursors {
    #[serde(default)]
    after: Option<String>,
}

impl<T> PagedResponse<T> {
    /// Only follow `after` when the API says there is a next page
    fn into_page(self) -> Page<T> {
        let next = self.paging.and_then(|p| match p.next {
            Some(_) => p.cursors.and_then(|c| c.after),
            None => None,
        });
        Page {
            data: self.data,
            next,
        }
    }
}

/// A Facebook page as returned by `/me/accounts`
#[derive(Debug, Deserialize)]
struct PageNode {
    id: String,
    #[serde(default)]
    instagram_business_account: Option<BusinessAccountRef>,
}

#[derive(Debug, Deserialize)]
struct BusinessAccountRef {
    id: String,
}

/// Graph API client
pub struct GraphClient {
    client: Client,
    api_root: String,
    access_token: String,
    page_size: u32,
    rate_limiter: Option<RateLimiter>,
}

impl GraphClient {
    /// Create a client from the source configuration
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("source-instagram/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_root: config.api_root(),
            access_token: config.access_token.clone(),
            page_size: config.page_size,
            rate_limiter: Some(RateLimiter::per_second(config.requests_per_second)),
        })
    }

    /// Disable client-side rate limiting
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limiter = None;
        self
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// GET a Graph API path and return the JSON body
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<JsonValue> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let url = format!("{}/{}", self.api_root, path.trim_start_matches('/'));
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(Error::Api(ApiError::from_response(status.as_u16(), &body)));
        }

        let value: JsonValue = serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("Invalid JSON from {path}: {e}")))?;

        // Some edges report failures inside a 200 body
        if value.get("error").is_some_and(JsonValue::is_object) {
            return Err(Error::Api(ApiError::from_response(status.as_u16(), &body)));
        }

        Ok(value)
    }

    async fn get_page(
        &self,
        path: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>> {
        let mut params = vec![
            ("fields".to_string(), fields.join(",")),
            ("limit".to_string(), self.page_size.to_string()),
        ];
        if let Some(after) = after {
            params.push(("after".to_string(), after));
        }

        let body = self.get_json(path, &params).await?;
        let paged: PagedResponse<JsonObject> = decode(path, body)?;
        Ok(paged.into_page())
    }

    async fn get_object(&self, id: &str, fields: &[String]) -> Result<JsonObject> {
        let params = vec![("fields".to_string(), fields.join(","))];
        let body = self.get_json(id, &params).await?;
        decode(id, body)
    }
}

#[async_trait]
impl InstagramApi for GraphClient {
    async fn enumerate_accounts(&self, after: Option<String>) -> Result<Page<Account>> {
        let mut params = vec![
            (
                "fields".to_string(),
                "id,instagram_business_account".to_string(),
            ),
            ("limit".to_string(), self.page_size.to_string()),
        ];
        if let Some(after) = after {
            params.push(("after".to_string(), after));
        }

        let body = self.get_json("me/accounts", &params).await?;
        let paged: PagedResponse<PageNode> = decode("me/accounts", body)?;
        let page = paged.into_page();

        let accounts = page
            .data
            .into_iter()
            .filter_map(|node| match node.instagram_business_account {
                Some(iba) => Some(Account::new(node.id, iba.id)),
                None => {
                    debug!(page_id = %node.id, "Page has no Instagram business account, skipping");
                    None
                }
            })
            .collect();

        Ok(Page {
            data: accounts,
            next: page.next,
        })
    }

    async fn get_profile(&self, account_id: &str, fields: &[String]) -> Result<JsonObject> {
        self.get_object(account_id, fields).await
    }

    async fn get_media(
        &self,
        account_id: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>> {
        self.get_page(&format!("{account_id}/media"), fields, after)
            .await
    }

    async fn get_media_item(&self, media_id: &str, fields: &[String]) -> Result<JsonObject> {
        self.get_object(media_id, fields).await
    }

    async fn get_insights(
        &self,
        object_id: &str,
        query: &InsightQuery,
    ) -> Result<Vec<InsightMetric>> {
        let path = format!("{object_id}/insights");
        let body = self.get_json(&path, &query.to_params()).await?;
        let paged: PagedResponse<InsightMetric> = decode(&path, body)?;
        Ok(paged.data)
    }

    async fn get_stories(
        &self,
        account_id: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>> {
        self.get_page(&format!("{account_id}/stories"), fields, after)
            .await
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("api_root", &self.api_root)
            .field("page_size", &self.page_size)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Timeouts and connection failures are transient; anything else is not
fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::Api(ApiError::transient(e.to_string()))
    } else {
        Error::Http(e)
    }
}

fn decode<T: serde::de::DeserializeOwned>(path: &str, body: JsonValue) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| Error::decode(format!("Unexpected response shape from {path}: {e}")))
}
