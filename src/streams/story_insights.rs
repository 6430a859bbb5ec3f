//! Per-story insights
//!
//! A story without enough viewers has no insights. That story is skipped
//! and the rest of the account's stories are still read.

use super::media_insights::insight_record;
use super::{Stream, StreamContext, StreamDescriptor};
use crate::api::InsightQuery;
use crate::engine::Message;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use async_trait::async_trait;

/// Stream name
pub const NAME: &str = "story_insights";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["id"],
    replication_key: None,
    base_properties: &[],
};

/// Metrics requested for every story
pub const STORY_METRICS: [&str; 6] = [
    "exits",
    "impressions",
    "reach",
    "replies",
    "taps_forward",
    "taps_back",
];

/// One record per story with insights
#[derive(Debug, Clone, Default)]
pub struct StoryInsights;

impl StoryInsights {
    /// Create the stream
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stream for StoryInsights {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let id_field = vec!["id".to_string()];
        let query = InsightQuery::new(STORY_METRICS);
        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let result = ctx
                .collect_pages("get_stories", |after| {
                    ctx.api.get_stories(account_id, &id_field, after)
                })
                .await;
            let Some(stories) = ctx.skip_expected_empty(NAME, &account, result)? else {
                continue;
            };

            for story in &stories {
                let Some(story_id) = story.get("id").and_then(JsonValue::as_str) else {
                    continue;
                };

                let values = match ctx
                    .call("get_insights", || ctx.api.get_insights(story_id, &query))
                    .await
                {
                    Ok(values) => values,
                    Err(Error::ExpectedEmpty(err)) => {
                        ctx.note_expected_empty(NAME, story_id, &err);
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                };

                if !values.is_empty() {
                    messages.push(ctx.record(NAME, insight_record(story_id, &values)));
                }
            }
        }

        Ok(messages)
    }
}
