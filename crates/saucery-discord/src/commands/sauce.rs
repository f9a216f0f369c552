use std::sync::Arc;

use anyhow::Context as _;
use serenity::all::{CommandInteraction, Context, EditInteractionResponse};
use tracing::warn;

use saucery_core::builder;
use saucery_core::fetch::saucenao::{filter_results, MIN_SIMILARITY, RESULT_CAP};
use saucery_core::payload::Embed;

use crate::commands::{no_sauce_embed, option_str};
use crate::convert;
use crate::router::AppState;

pub async fn run(ctx: &Context, cmd: &CommandInteraction, state: Arc<AppState>) -> anyhow::Result<()> {
    let link = option_str(cmd, "link").context("missing link option")?;
    cmd.defer(&ctx.http).await?;

    let results = match state.sauce.search(&link).await {
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
