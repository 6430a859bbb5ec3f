//! Per-media insights
//!
//! Media come newest first. Insights are unavailable for anything posted
//! before the account converted to a business account, and once one item
//! reports that, every older item will too. Enumeration for the account
//! stops at the first such item, including any further pages. Items with
//! too few viewers are skipped one at a time.

use super::{Stream, StreamContext, StreamDescriptor};
use crate::api::{InsightMetric, InsightQuery};
use crate::engine::Message;
use crate::error::{Error, Result};
use crate::retry::is_pre_conversion_media;
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use tracing::info;

/// Stream name
pub const NAME: &str = "media_insights";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["id"],
    replication_key: None,
    base_properties: &[],
};

/// Fields needed to pick the metric set of a media item
pub const MEDIA_LOOKUP_FIELDS: [&str; 3] = ["id", "media_product_type", "media_type"];

const CAROUSEL_METRICS: &[&str] = &[
    "carousel_album_engagement",
    "carousel_album_impressions",
    "carousel_album_reach",
    "carousel_album_saved",
    "carousel_album_video_views",
];

const REELS_METRICS: &[&str] = &[
    "comments",
    "ig_reels_avg_watch_time",
    "ig_reels_video_view_total_time",
    "likes",
    "plays",
    "reach",
    "saved",
    "shares",
];

const VIDEO_METRICS: &[&str] = &["engagement", "impressions", "reach", "saved", "video_views"];

const DEFAULT_METRICS: &[&str] = &["engagement", "impressions", "reach", "saved"];

/// Metrics available for a media item of the given type
pub fn metrics_for(
    media_type: Option<&str>,
    media_product_type: Option<&str>,
) -> &'static [&'static str] {
    if media_product_type == Some("REELS") {
        return REELS_METRICS;
    }
    match media_type {
        Some("CAROUSEL_ALBUM") => CAROUSEL_METRICS,
        Some("VIDEO") => VIDEO_METRICS,
        _ => DEFAULT_METRICS,
    }
}

/// `{id, <metric>: <value>...}` from an insights response
pub(crate) fn insight_record(id: &str, metrics: &[InsightMetric]) -> JsonObject {
    let mut record = JsonObject::new();
    record.insert("id".to_string(), id.into());
    for metric in metrics {
        if let Some(value) = metric.first_value() {
            record.insert(metric.name.clone(), value.value.clone());
        }
    }
    record
}

/// One record per media item with insights
#[derive(Debug, Clone, Default)]
pub struct MediaInsights;

impl MediaInsights {
    /// Create the stream
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stream for MediaInsights {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let lookup_fields: Vec<String> =
            MEDIA_LOOKUP_FIELDS.iter().map(|f| f.to_string()).collect();
        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let mut after: Option<String> = None;

            'media: loop {
                let result = ctx
                    .call("get_media", || {
                        ctx.api.get_media(account_id, &lookup_fields, after.clone())
                    })
                    .await;
                let Some(page) = ctx.skip_expected_empty(NAME, &account, result)? else {
                    break 'media;
                };

                for item in &page.data {
                    let Some(media_id) = item.get("id").and_then(JsonValue::as_str) else {
                        continue;
                    };
                    let metrics = metrics_for(
                        item.get("media_type").and_then(JsonValue::as_str),
                        item.get("media_product_type").and_then(JsonValue::as_str),
                    );
                    let query = InsightQuery::new(metrics.iter().copied());

                    match ctx
                        .call("get_insights", || ctx.api.get_insights(media_id, &query))
                        .await
                    {
                        Ok(values) => {
                            messages.push(ctx.record(NAME, insight_record(media_id, &values)));
                        }
                        Err(Error::ExpectedEmpty(err)) if is_pre_conversion_media(&err) => {
                            ctx.note_expected_empty(NAME, media_id, &err);
                            info!(
                                stream = NAME,
                                account = account_id,
                                media = media_id,
                                "Media predates the business account conversion, skipping older media"
                            );
                            break 'media;
                        }
                        Err(Error::ExpectedEmpty(err)) => {
                            ctx.note_expected_empty(NAME, media_id, &err);
                        }
                        Err(e) => return Err(e),
                    }
                }

                match page.next {
                    Some(next) => after = Some(next),
                    None => break,
                }
            }
        }

        Ok(messages)
    }
}
