//! Per-run stream context

use crate::api::{InstagramApi, Page};
use crate::engine::Message;
use crate::error::{ApiError, Error, Result};
use crate::retry::RetryPolicy;
use crate::state::{State, WindowPolicy};
use crate::types::{Account, JsonObject};
use crate::urls::clean_record_urls;
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Everything a stream may use while reading
///
/// The state is a read-only snapshot: streams report their next bookmark
/// in a state message and never write to the store themselves.
pub struct StreamContext<'a> {
    /// Upstream API
    pub api: &'a dyn InstagramApi,
    /// Retry policy gating every upstream call
    pub retry: &'a RetryPolicy,
    /// State at the start of the run
    pub state: &'a State,
    /// Date the incremental windows are computed against
    pub today: NaiveDate,
    /// Incremental window limits
    pub window: WindowPolicy,
    /// Query keys removed from CDN URLs
    pub strip_url_params: &'a [String],
    /// Extraction timestamp stamped on records
    pub extracted_at: DateTime<Utc>,
    expected_empty: AtomicUsize,
}

impl<'a> StreamContext<'a> {
    /// Create a context for today with default window limits
    pub fn new(api: &'a dyn InstagramApi, retry: &'a RetryPolicy, state: &'a State) -> Self {
        let now = Utc::now();
        Self {
            api,
            retry,
            state,
            today: now.date_naive(),
            window: WindowPolicy::default(),
            strip_url_params: &[],
            extracted_at: now,
            expected_empty: AtomicUsize::new(0),
        }
    }

    /// Compute windows against a fixed date
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Set window limits
    #[must_use]
    pub fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    /// Set the URL query keys to strip
    #[must_use]
    pub fn with_strip_url_params(mut self, keys: &'a [String]) -> Self {
        self.strip_url_params = keys;
        self
    }

    /// Set the extraction timestamp
    #[must_use]
    pub fn with_extracted_at(mut self, at: DateTime<Utc>) -> Self {
        self.extracted_at = at;
        self
    }

    /// Run an upstream call under the retry policy
    pub async fn call<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.retry.run(operation, op).await
    }

    /// Drain a paged edge, retrying each page on its own
    pub async fn collect_pages<T, F, Fut>(&self, operation: &str, mut fetch: F) -> Result<Vec<T>>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page = self.retry.run(operation, || fetch(after.clone())).await?;
            items.extend(page.data);

            match page.next {
                Some(next) => after = Some(next),
                None => break,
            }
        }

        Ok(items)
    }

    /// All business accounts reachable with the token
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let accounts = self
            .collect_pages("enumerate_accounts", |after| {
                self.api.enumerate_accounts(after)
            })
            .await?;
        debug!(count = accounts.len(), "Enumerated business accounts");
        Ok(accounts)
    }

    /// Wrap a record in a message
    pub fn record(&self, stream: &str, record: JsonObject) -> Message {
        Message::record(stream, record, self.extracted_at)
    }

    /// Strip volatile query keys from the record's URL fields
    pub fn clean_urls(&self, record: &mut JsonObject) {
        clean_record_urls(record, self.strip_url_params);
    }

    /// Turn an account-level expected-empty failure into a skip.
    ///
    /// Other errors pass through.
    pub fn skip_expected_empty<T>(
        &self,
        stream: &str,
        account: &Account,
        result: Result<T>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(Error::ExpectedEmpty(err)) => {
                self.note_expected_empty(stream, &account.business_account_id, &err);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Log and count an expected-empty condition
    pub fn note_expected_empty(&self, stream: &str, object_id: &str, err: &ApiError) {
        warn!(
            stream,
            object = object_id,
            code = ?err.code,
            subcode = ?err.error_subcode,
            "No data available, skipping: {}",
            err.details()
        );
        self.expected_empty.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of expected-empty skips so far
    pub fn expected_empty_count(&self) -> usize {
        self.expected_empty.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for StreamContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamContext")
            .field("today", &self.today)
            .field("window", &self.window)
            .field("strip_url_params", &self.strip_url_params)
            .finish_non_exhaustive()
    }
}
