//! Media of each business account
//!
//! Carousel albums list their children as bare ids. When `children` is
//! selected, every child is fetched on its own with the parent's selected
//! fields, minus the ones only a top-level post has.

use super::{Stream, StreamContext, StreamDescriptor};
use crate::catalog::FieldSelection;
use crate::engine::Message;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use tracing::{debug, info};

/// Stream name
pub const NAME: &str = "media";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["id"],
    replication_key: None,
    base_properties: &["page_id", "business_account_id"],
};

/// Fields a carousel child does not support
pub const CHILD_EXCLUDED_FIELDS: [&str; 5] = [
    "caption",
    "comments_count",
    "is_comment_enabled",
    "like_count",
    "children",
];

/// Media type of carousel posts
pub const CAROUSEL_ALBUM: &str = "CAROUSEL_ALBUM";

/// Media records, newest first per account
#[derive(Debug, Clone)]
pub struct Media {
    fields: FieldSelection,
}

impl Media {
    /// Create the stream with its field selection
    pub fn new(fields: FieldSelection) -> Self {
        Self { fields }
    }

    async fn expand_children(&self, ctx: &StreamContext<'_>, item: &mut JsonObject) -> Result<()> {
        if item.get("media_type").and_then(JsonValue::as_str) != Some(CAROUSEL_ALBUM) {
            return Ok(());
        }

        let child_ids: Vec<String> = item
            .get("children")
            .and_then(|c| c.get("data"))
            .and_then(JsonValue::as_array)
            .map(|data| {
                data.iter()
                    .filter_map(|c| c.get("id").and_then(JsonValue::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if child_ids.is_empty() {
            return Ok(());
        }

        let child_fields = self.fields.request_fields_without(&CHILD_EXCLUDED_FIELDS);
        let mut children = Vec::with_capacity(child_ids.len());

        for child_id in &child_ids {
            let result = ctx
                .call("get_media_item", || {
                    ctx.api.get_media_item(child_id, &child_fields)
                })
                .await;
            let mut child = match result {
                Ok(child) => child,
                Err(Error::ExpectedEmpty(err)) => {
                    ctx.note_expected_empty(NAME, child_id, &err);
                    continue;
                }
                Err(e) => return Err(e),
            };
            ctx.clean_urls(&mut child);
            children.push(JsonValue::Object(child));
        }

        debug!(count = children.len(), "Expanded carousel children");
        item.insert("children".to_string(), JsonValue::Array(children));
        Ok(())
    }
}

#[async_trait]
impl Stream for Media {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let fields = self.fields.request_fields_without(&[]);
        let expand = self.fields.contains("children");
        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let result = ctx
                .collect_pages("get_media", |after| {
                    ctx.api.get_media(account_id, &fields, after)
                })
                .await;
            let Some(items) = ctx.skip_expected_empty(NAME, &account, result)? else {
                continue;
            };

            for mut item in items {
                item.insert("page_id".to_string(), account.page_id.clone().into());
                item.insert(
                    "business_account_id".to_string(),
                    account.business_account_id.clone().into(),
                );
                if expand {
                    self.expand_children(ctx, &mut item).await?;
                }
                ctx.clean_urls(&mut item);
                messages.push(ctx.record(NAME, item));
            }
        }

        info!(stream = NAME, records = messages.len(), "Finished media");
        Ok(messages)
    }
}
