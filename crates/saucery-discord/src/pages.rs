//! Pagination target over a plain channel message. Interaction replies are
//! resolved to their underlying message before a session starts, so this
//! one target covers both.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{ChannelId, Http, MessageId};

use saucery_core::pagination::PageTarget;
use saucery_core::payload::ReplyPayload;
use saucery_core::Result;

use crate::{convert, discord_err};

pub struct MessagePageTarget {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
}

impl MessagePageTarget {
    pub fn new(http: Arc<Http>, channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            http,
            channel_id,
            message_id,
        }
    }
}

#[async_trait]
impl PageTarget for MessagePageTarget {
    async fn draw(&self, page: ReplyPayload) -> Result<()> {
        self.channel_id
            .edit_message(&self.http, self.message_id, convert::edit_message(&page))
            .await
            .map_err(discord_err)?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        self.channel_id
            .delete_message(&self.http, self.message_id)
            .await
            .map_err(discord_err)
    }
}
