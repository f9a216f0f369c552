//! The Discord side of the webhook relay: a channel webhook named after
//! the source author, executed with their avatar.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{ChannelId, Context, CreateWebhook, Http, Message, MessageId, Webhook};

use saucery_core::payload::ReplyPayload;
use saucery_core::relay::{RelayEndpoint, WebhookRelay};
use saucery_core::Result;

use crate::{convert, discord_err};

pub struct DiscordEndpoint {
    http: Arc<Http>,
    webhook: Webhook,
    username: String,
    avatar_url: String,
    channel_id: ChannelId,
    message_id: MessageId,
}

/// Create the impersonation webhook for a source message.
pub async fn open(ctx: &Context, msg: &Message) -> Result<WebhookRelay<DiscordEndpoint>> {
    let webhook = msg
        .channel_id
        .create_webhook(&ctx.http, CreateWebhook::new(msg.author.name.clone()))
        .await
        .map_err(discord_err)?;

    Ok(WebhookRelay::new(DiscordEndpoint {
        http: ctx.http.clone(),
        webhook,
        username: msg.author.name.clone(),
        avatar_url: msg.author.face(),
        channel_id: msg.channel_id,
        message_id: msg.id,
    }))
}

#[async_trait]
impl RelayEndpoint for DiscordEndpoint {
    async fn execute(&self, payload: ReplyPayload) -> Result<()> {
        let builder = convert::execute_webhook(&payload)
            .username(self.username.clone())
            .avatar_url(self.avatar_url.clone());

        // wait=true so sequential payloads land in order.
        self.webhook
            .execute(&self.http, true, builder)
            .await
            .map_err(discord_err)?;
        Ok(())
    }

    async fn delete_source(&self) -> Result<()> {
        self.http
            .delete_message(self.channel_id, self.message_id, None)
            .await
            .map_err(discord_err)
    }

    async fn delete_endpoint(&self) -> Result<()> {
        self.webhook.delete(&self.http).await.map_err(discord_err)
    }
}
