//! In-memory API for stream and engine tests

use super::{InsightMetric, InsightQuery, InstagramApi, Page};
use crate::error::{ApiError, Error, Result};
use crate::types::{Account, JsonObject};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub(crate) type Canned<T> = std::result::Result<T, ApiError>;

/// Serves canned responses and records every call in order
#[derive(Default)]
pub(crate) struct FakeApi {
    pub(crate) accounts: Vec<Account>,
    pub(crate) profiles: HashMap<String, Canned<JsonObject>>,
    pub(crate) media: HashMap<String, Vec<Vec<JsonObject>>>,
    pub(crate) stories: HashMap<String, Vec<JsonObject>>,
    pub(crate) items: HashMap<String, JsonObject>,
    pub(crate) insights: HashMap<String, Canned<Vec<InsightMetric>>>,
    failures: Mutex<HashMap<String, VecDeque<ApiError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn with_accounts(ids: &[(&str, &str)]) -> Self {
        Self {
            accounts: ids.iter().map(|(p, b)| Account::new(*p, *b)).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn insight_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("insights:"))
            .collect()
    }

    /// Fail the next call with this key before serving the canned response
    pub(crate) fn fail_once(&self, key: &str, err: ApiError) {
        self.failures
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(err);
    }

    fn record_call(&self, key: String) -> Result<()> {
        self.calls.lock().unwrap().push(key.clone());
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(Error::Api(err)),
            None => Ok(()),
        }
    }

    fn insight_key(object_id: &str, query: &InsightQuery) -> String {
        match query.period {
            Some(period) => format!("insights:{object_id}:{period}"),
            None => format!("insights:{object_id}"),
        }
    }
}

fn page_index(after: Option<&str>) -> usize {
    after.and_then(|a| a.parse().ok()).unwrap_or(0)
}

#[async_trait]
impl InstagramApi for FakeApi {
    async fn enumerate_accounts(&self, after: Option<String>) -> Result<Page<Account>> {
        self.record_call(format!("accounts:{}", after.unwrap_or_default()))?;
        Ok(Page::last(self.accounts.clone()))
    }

    async fn get_profile(&self, account_id: &str, fields: &[String]) -> Result<JsonObject> {
        self.record_call(format!("profile:{account_id}:{}", fields.join(",")))?;
        self.profiles
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| Ok(JsonObject::new()))
            .map_err(Error::Api)
    }

    async fn get_media(
        &self,
        account_id: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>> {
        self.record_call(format!(
            "media:{account_id}:{}:{}",
            after.as_deref().unwrap_or(""),
            fields.join(",")
        ))?;
        let pages = self.media.get(account_id).cloned().unwrap_or_default();
        let index = page_index(after.as_deref());
        let data = pages.get(index).cloned().unwrap_or_default();
        if index + 1 < pages.len() {
            Ok(Page::with_next(data, (index + 1).to_string()))
        } else {
            Ok(Page::last(data))
        }
    }

    async fn get_media_item(&self, media_id: &str, fields: &[String]) -> Result<JsonObject> {
        self.record_call(format!("item:{media_id}:{}", fields.join(",")))?;
        Ok(self.items.get(media_id).cloned().unwrap_or_default())
    }

    async fn get_insights(
        &self,
        object_id: &str,
        query: &InsightQuery,
    ) -> Result<Vec<InsightMetric>> {
        let key = Self::insight_key(object_id, query);
        self.record_call(key.clone())?;
        self.insights
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
            .map_err(Error::Api)
    }

    async fn get_stories(
        &self,
        account_id: &str,
        fields: &[String],
        after: Option<String>,
    ) -> Result<Page<JsonObject>> {
        self.record_call(format!(
            "stories:{account_id}:{}:{}",
            after.as_deref().unwrap_or(""),
            fields.join(",")
        ))?;
        Ok(Page::last(self.stories.get(account_id).cloned().unwrap_or_default()))
    }
}

