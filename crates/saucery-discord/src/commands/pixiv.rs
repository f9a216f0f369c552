use std::sync::Arc;

use anyhow::Context as _;
use serenity::all::{CommandInteraction, Context, EditInteractionResponse};
use tracing::info;

use saucery_core::builder::{self, MediaItem, PackBudget, PayloadPacker};
use saucery_core::fetch::pixiv::{self, Artwork};
use saucery_core::payload::{Attachment, ReplyPayload};

use crate::commands::option_str;
use crate::pages::MessagePageTarget;
use crate::router::{upload_tier, AppState};
use crate::convert;

pub async fn run(ctx: &Context, cmd: &CommandInteraction, state: Arc<AppState>) -> anyhow::Result<()> {
    let id = option_str(cmd, "id").context("missing id option")?;
    cmd.defer(&ctx.http).await?;

    let budget = PackBudget::for_tier(upload_tier(ctx, cmd.guild_id));

    let pages = match state.pixiv.get_artwork(&id).await? {
        Artwork::Illust(meta) => {
            info!("downloading {} page(s)", meta.page_count);
            let mut packer = PayloadPacker::new(budget);
            let mut pages = Vec::new();

            for url in pixiv::page_urls(&meta) {
                let bytes = state.pixiv.download(&url).await?;
                let name = pixiv::file_name(&url).to_string();
                let item = MediaItem {
                    embed: builder::pixiv_embed(&name, meta.created_at()),
                    attachment: Attachment::new(name, bytes),
                };
                if let Some(page) = packer.push(item) {
                    pages.push(page);
                }
            }
            pages.extend(packer.finish());

            if let Some(embed) = pages.first_mut().and_then(|p| p.embeds.first_mut()) {
                builder::decorate_pixiv_lead(embed, &meta);
            }
            pages
        }
        Artwork::Ugoira(meta, frames) => {
            info!("transcoding ugoira {}", meta.id);
            let file =
                pixiv::transcode_ugoira(&state.pixiv, &meta.id, &frames, &state.cfg.ffmpeg_path)
                    .await?;
            vec![ReplyPayload {
                attachments: vec![file],
                ..ReplyPayload::default()
            }]
        }
    };

    if pages.is_empty() {
        cmd.edit_response(
            &ctx.http,
            EditInteractionResponse::new().content("Nothing to show."),
        )
        .await?;
        return Ok(());
    }

    // Materialize the reply first, then hand the message to the pagination
    // manager, which redraws page 0 with its controls.
    cmd.edit_response(&ctx.http, convert::edit_response(&pages[0])).await?;
    let reply = cmd.get_response(&ctx.http).await?;

    let target = Arc::new(MessagePageTarget::new(
        ctx.http.clone(),
        reply.channel_id,
        reply.id,
    ));
    state.pages.start(target, pages).await?;
    Ok(())
}
