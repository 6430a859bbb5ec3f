//! Business account profiles

use super::{Stream, StreamContext, StreamDescriptor};
use crate::catalog::FieldSelection;
use crate::engine::Message;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Stream name
pub const NAME: &str = "users";

pub(crate) static DESCRIPTOR: StreamDescriptor = StreamDescriptor {
    name: NAME,
    key_properties: &["id"],
    replication_key: None,
    base_properties: &["page_id"],
};

/// One profile record per business account
#[derive(Debug, Clone)]
pub struct Users {
    fields: FieldSelection,
}

impl Users {
    /// Create the stream with its field selection
    pub fn new(fields: FieldSelection) -> Self {
        Self { fields }
    }
}

#[async_trait]
impl Stream for Users {
    fn descriptor(&self) -> &'static StreamDescriptor {
        &DESCRIPTOR
    }

    async fn read(&self, ctx: &StreamContext<'_>) -> Result<Vec<Message>> {
        let fields = self.fields.request_fields_without(&[]);
        let mut messages = Vec::new();

        for account in ctx.accounts().await? {
            let account_id = account.business_account_id.as_str();
            let result = ctx
                .call("get_profile", || ctx.api.get_profile(account_id, &fields))
                .await;
            let Some(mut profile) = ctx.skip_expected_empty(NAME, &account, result)? else {
                continue;
            };

            profile.insert("page_id".to_string(), account.page_id.clone().into());
            ctx.clean_urls(&mut profile);
            messages.push(ctx.record(NAME, profile));
        }

        info!(stream = NAME, records = messages.len(), "Finished profiles");
        Ok(messages)
    }
}
