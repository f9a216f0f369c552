//! "Get Sauce" message context-menu command: reverse-search the image on
//! the target message.

use std::sync::Arc;

use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse, Message, ResolvedTarget,
};
use tracing::warn;

use saucery_core::builder;
use saucery_core::fetch::saucenao::{filter_results, MIN_SIMILARITY, RESULT_CAP};
use saucery_core::payload::Embed;

use crate::commands::{bot_embed, no_sauce_embed, RED};
use crate::convert;
use crate::router::AppState;

/// First attachment URL, else the first embed's url/thumbnail/image.
fn image_url(message: &Message) -> Option<String> {
    if let Some(attachment) = message.attachments.first() {
        return Some(attachment.url.clone());
    }

    let embed = message.embeds.first()?;
    embed
        .url
        .clone()
        .or_else(|| embed.thumbnail.as_ref().map(|t| t.url.clone()))
        .or_else(|| embed.image.as_ref().map(|i| i.url.clone()))
}

pub async fn run(ctx: &Context, cmd: &CommandInteraction, state: Arc<AppState>) -> anyhow::Result<()> {
    let Some(ResolvedTarget::Message(message)) = cmd.data.target() else {
        return Ok(());
    };

    let Some(url) = image_url(message) else {
        let embed = bot_embed(ctx, RED)
            .title("No attachments found!")
            .description("Make sure you use this command on a message with an image.");
        cmd.create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .ephemeral(true)
                    .add_embed(convert::create_embed(&embed)),
            ),
        )
        .await?;
        return Ok(());
    };

    cmd.defer(&ctx.http).await?;

    let results = match state.sauce.search(&url).await {
        Ok(results) => results,
        Err(err) => {
            warn!("sauce lookup failed: {err}");
            Vec::new()
        }
    };

    let mut embeds: Vec<Embed> = filter_results(results, MIN_SIMILARITY, RESULT_CAP)
        .iter()
        .map(builder::sauce_embed)
        .collect();
    if embeds.is_empty() {
        embeds.push(no_sauce_embed(ctx));
    }

    cmd.edit_response(
        &ctx.http,
        EditInteractionResponse::new().embeds(embeds.iter().map(convert::create_embed).collect()),
    )
    .await?;
    Ok(())
}
