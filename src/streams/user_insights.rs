//! Incremental account insights
//!
//! Account metrics come in four aggregation periods. Each period is queried
//! separately over the same window, then everything reported for the same
//! `end_time` is merged into a single day record. Weekly and 28-day metrics
//! share names with daily ones, so their keys carry the period as a suffix
//! (`reach_week`, `impressions_days_28`).

use super::{Stream, StreamContext, StreamDescriptor};
use crate::api::{InsightMetric, InsightQuery, Period};
use crate::engine::Message;
use crate::error::Result;
use crate::state::build_range;
use crate::types::{Account, JsonObject};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::info;

/// Stream name
pub const NAME: &str = "user_insights";

/// Bookmark key, also the replication key
pub const BOOKMARK_KEY: &str = "date";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["business_account_id", "date"],
    replication_key: Some(BOOKMARK_KEY),
    base_properties: &[],
};

/// Metrics requested per period
pub const PERIOD_METRICS: [(Period, &[&str]); 4] = [
    (
        Period::Day,
        &[
            "email_contacts",
            "follower_count",
            "get_directions_clicks",
            "impressions",
            "phone_call_clicks",
            "profile_views",
            "reach",
            "text_message_clicks",
            "website_clicks",
        ],
    ),
    (Period::Week, &["impressions", "reach"]),
    (Period::Days28, &["impressions", "reach"]),
    (Period::Lifetime, &["online_followers"]),
];

/// Day records keyed by `end_time`
pub type DayRecords = BTreeMap<String, JsonObject>;

/// Incremental, one record per account and day
#[derive(Debug, Clone, Default)]
pub struct UserInsights;

impl UserInsights {
    /// Create the stream
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stream for UserInsights {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let bookmark = ctx.state.get_bookmark_str(NAME, BOOKMARK_KEY);
        let window = build_range(bookmark, ctx.today, &ctx.window)?;
        info!(
            stream = NAME,
            since = %window.since,
            until = %window.until,
            "Requesting insights window"
        );

        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let mut days = DayRecords::new();

            for (period, metrics) in PERIOD_METRICS {
                let query = InsightQuery::new(metrics.iter().copied())
                    .period(period)
                    .between(window.since, window.until);
                let result = ctx
                    .call("get_insights", || ctx.api.get_insights(account_id, &query))
                    .await;
                // A period without data leaves the others intact
                let Some(values) = ctx.skip_expected_empty(NAME, &account, result)? else {
                    continue;
                };
                merge_period(&mut days, period, &values);
            }

            messages.extend(
                day_records(&account, days)
                    .into_iter()
                    .map(|record| ctx.record(NAME, record)),
            );
        }

        // The bookmark is the requested upper bound, whatever the data covered
        let next = ctx
            .state
            .with_bookmark(NAME, BOOKMARK_KEY, window.next_bookmark_value());
        messages.push(Message::state(next));

        Ok(messages)
    }
}

/// Metric key for a period: weekly and 28-day metrics get a suffix
pub fn metric_key(name: &str, period: Period) -> String {
    if period.suffixes_metric() {
        format!("{name}_{period}")
    } else {
        name.to_string()
    }
}

/// Fold one period's results into the per-day map
pub fn merge_period(days: &mut DayRecords, period: Period, metrics: &[InsightMetric]) {
    for metric in metrics {
        let key = metric_key(&metric.name, period);
        for value in &metric.values {
            let Some(end_time) = &value.end_time else {
                continue;
            };
            days.entry(end_time.clone())
                .or_default()
                .insert(key.clone(), value.value.clone());
        }
    }
}

/// Day records in ascending date order with the account ids attached
pub fn day_records(account: &Account, days: DayRecords) -> Vec<JsonObject> {
    days.into_iter()
        .map(|(end_time, mut record)| {
            record.insert("page_id".to_string(), account.page_id.clone().into());
            record.insert(
                "business_account_id".to_string(),
                account.business_account_id.clone().into(),
            );
            record.insert("date".to_string(), end_time.into());
            record
        })
        .collect()
}
