//! "Send to DMs" message context-menu command: forward the target message
//! to the invoker's DMs.

use std::sync::Arc;

use serenity::all::{
    CommandInteraction, Context, CreateAttachment, CreateEmbed, CreateMessage,
    EditInteractionResponse, Message, ResolvedTarget,
};
use tracing::warn;

use crate::commands::{bot_embed, GREEN, RED};
use crate::convert;
use crate::router::AppState;

pub async fn run(ctx: &Context, cmd: &CommandInteraction, _state: Arc<AppState>) -> anyhow::Result<()> {
    let Some(ResolvedTarget::Message(message)) = cmd.data.target() else {
        return Ok(());
    };
    let message = message.clone();

    cmd.defer_ephemeral(&ctx.http).await?;

    let now = chrono::Utc::now().timestamp();
    let embed = match forward(ctx, cmd, &message).await {
        Ok(()) => bot_embed(ctx, GREEN)
            .title("Message saved!")
            .description("Check your DMs.")
            .timestamp(now),
        Err(err) => {
            // Closed DMs land here; report it instead of failing the command.
            warn!("dm forward failed: {err:#}");
            bot_embed(ctx, RED)
                .title("Could not access your DMs!")
                .description("Please make sure your DMs are open.")
                .timestamp(now)
        }
    };

    cmd.edit_response(
        &ctx.http,
        EditInteractionResponse::new().embed(convert::create_embed(&embed)),
    )
    .await?;
    Ok(())
}

async fn forward(ctx: &Context, cmd: &CommandInteraction, message: &Message) -> anyhow::Result<()> {
    let mut builder = CreateMessage::new().embeds(
        message
            .embeds
            .iter()
            .cloned()
            .map(CreateEmbed::from)
            .collect(),
    );

    if !message.content.is_empty() {
        builder = builder.content(message.content.clone());
    }
    for attachment in &message.attachments {
        builder = builder.add_file(CreateAttachment::url(&ctx.http, &attachment.url).await?);
    }

    cmd.user.direct_message(&ctx.http, builder).await?;
    Ok(())
}
