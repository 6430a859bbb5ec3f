//! Live stories of each business account

use super::{Stream, StreamContext, StreamDescriptor};
use crate::catalog::FieldSelection;
use crate::engine::Message;
use crate::error::Result;
use async_trait::async_trait;

/// Stream name
pub const NAME: &str = "stories";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["id"],
    replication_key: None,
    base_properties: &["page_id", "business_account_id"],
};

/// Story records
#[derive(Debug, Clone)]
pub struct Stories {
    fields: FieldSelection,
}

impl Stories {
    /// Create the stream with its field selection
    pub fn new(fields: FieldSelection) -> Self {
        Self { fields }
    }
}

#[async_trait]
impl Stream for Stories {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let fields = self.fields.request_fields_without(&[]);
        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let result = ctx
                .collect_pages("get_stories", |after| {
                    ctx.api.get_stories(account_id, &fields, after)
                })
                .await;
            let Some(stories) = ctx.skip_expected_empty(NAME, &account, result)? else {
                continue;
            };

            for mut story in stories {
                story.insert("page_id".to_string(), account.page_id.clone().into());
                story.insert(
                    "business_account_id".to_string(),
                    account.business_account_id.clone().into(),
                );
                ctx.clean_urls(&mut story);
                messages.push(ctx.record(NAME, story));
            }
        }

        Ok(messages)
    }
}
