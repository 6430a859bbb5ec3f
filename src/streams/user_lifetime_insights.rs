//! Lifetime audience insights
//!
//! Audience breakdowns (city, country, gender/age, locale) only exist with a
//! lifetime period. Each metric becomes its own record.

use super::{Stream, StreamContext, StreamDescriptor};
use crate::api::{InsightMetric, InsightQuery, Period};
use crate::engine::Message;
use crate::error::Result;
use crate::types::{Account, JsonObject, JsonValue};
use async_trait::async_trait;

/// Stream name
pub const NAME: &str = "user_lifetime_insights";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["business_account_id", "metric", "date"],
    replication_key: None,
    base_properties: &[],
};

/// Lifetime audience metrics
pub const AUDIENCE_METRICS: [&str; 4] = [
    "audience_city",
    "audience_country",
    "audience_gender_age",
    "audience_locale",
];

/// One record per account and audience metric
#[derive(Debug, Clone, Default)]
pub struct UserLifetimeInsights;

impl UserLifetimeInsights {
    /// Create the stream
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stream for UserLifetimeInsights {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let query = InsightQuery::new(AUDIENCE_METRICS).period(Period::Lifetime);
        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let result = ctx
                .call("get_insights", || ctx.api.get_insights(account_id, &query))
                .await;
            let Some(metrics) = ctx.skip_expected_empty(NAME, &account, result)? else {
                continue;
            };

            messages.extend(
                metrics
                    .iter()
                    .filter_map(|metric| metric_record(&account, metric))
                    .map(|record| ctx.record(NAME, record)),
            );
        }

        Ok(messages)
    }
}

/// Flatten one metric; metrics without values produce nothing
fn metric_record(account: &Account, metric: &InsightMetric) -> Option<JsonObject> {
    let value = metric.first_value()?;

    let mut record = JsonObject::new();
    record.insert("page_id".to_string(), account.page_id.clone().into());
    record.insert(
        "business_account_id".to_string(),
        account.business_account_id.clone().into(),
    );
    record.insert("metric".to_string(), metric.name.clone().into());
    record.insert(
        "date".to_string(),
        value.end_time.clone().map_or(JsonValue::Null, JsonValue::String),
    );
    record.insert("value".to_string(), value.value.clone());
    Some(record)
}
