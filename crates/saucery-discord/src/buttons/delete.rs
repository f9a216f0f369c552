//! `msg-delete` control: remove the relayed message the button sits on.

use std::sync::Arc;

use serenity::all::{ComponentInteraction, Context, EditInteractionResponse};

use crate::router::AppState;

pub async fn run(
    ctx: &Context,
    component: &ComponentInteraction,
    _arg: Option<&str>,
    _state: Arc<AppState>,
) -> anyhow::Result<()> {
    component.defer_ephemeral(&ctx.http).await?;
    component.message.delete(&ctx.http).await?;
    component
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().content("Message deleted."),
        )
        .await?;
    Ok(())
}
