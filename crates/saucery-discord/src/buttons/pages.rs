//! `paginate` control: drive a live pagination session.

use std::sync::Arc;

use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage,
};
use tracing::info;

use saucery_core::pagination::NavAction;

use crate::router::AppState;

pub async fn run(
    ctx: &Context,
    component: &ComponentInteraction,
    arg: Option<&str>,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    // Control ids look like `paginate|<action>:<session id>`.
    let Some((action, id)) = arg.and_then(|a| a.split_once(':')) else {
        return Ok(());
    };
    let Some(action) = NavAction::parse(action) else {
        return Ok(());
    };

    info!("running paginate action {action:?}");

    match action {
        NavAction::Save => {
            if state.pages.save(id).await? {
                ephemeral(ctx, component, "Pages saved!").await
            } else {
                expired(ctx, component, action).await
            }
        }
        NavAction::Delete => {
            if state.pages.delete(id).await? {
                ephemeral(ctx, component, "Pages deleted!").await
            } else {
                expired(ctx, component, action).await
            }
        }
        NavAction::Prev | NavAction::Next => {
            let drew = match action {
                NavAction::Prev => state.pages.prev(id).await?,
                _ => state.pages.next(id).await?,
            };
            match drew {
                Some(true) => ephemeral(ctx, component, "Page updated!").await,
                Some(false) => ephemeral(ctx, component, "You've reached the end!").await,
                None => expired(ctx, component, action).await,
            }
        }
    }
}

async fn ephemeral(
    ctx: &Context,
    component: &ComponentInteraction,
    text: &str,
) -> anyhow::Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .ephemeral(true)
                    .content(text),
            ),
        )
        .await?;
    Ok(())
}

/// Stale session (restart, or already cleared). Clear the lingering
/// controls and report expiry — except `delete`, which still removes the
/// orphaned message directly.
async fn expired(
    ctx: &Context,
    component: &ComponentInteraction,
    action: NavAction,
) -> anyhow::Result<()> {
    if action == NavAction::Delete {
        info!("deleting orphaned pagination message");
        component.message.delete(&ctx.http).await?;
        return ephemeral(ctx, component, "Pages deleted!").await;
    }

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new().components(Vec::new()),
            ),
        )
        .await?;
    component
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .ephemeral(true)
                .content("Pagination has already expired!"),
        )
        .await?;
    Ok(())
}
