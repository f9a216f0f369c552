//! Message link handlers, one per platform. Each republishes enriched
//! content through a webhook relay styled as the original author.

use std::sync::Arc;

use serenity::all::{Context, Message};

use saucery_core::matcher::{LinkMatch, Platform};

use crate::router::AppState;

mod instagram;
mod pixiv;
mod tiktok;
mod twitter;

pub async fn dispatch(
    ctx: &Context,
    msg: &Message,
    link: &LinkMatch,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    match link.platform {
        Platform::Pixiv => pixiv::handle(ctx, msg, link, state).await,
        Platform::Twitter => twitter::handle(ctx, msg, state).await,
        Platform::Tiktok => tiktok::handle(ctx, msg, state).await,
        Platform::Instagram => instagram::handle(ctx, msg, state).await,
    }
}
