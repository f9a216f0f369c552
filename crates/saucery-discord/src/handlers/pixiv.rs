use std::sync::Arc;

use serenity::all::{Context, Message};
use tracing::info;

use saucery_core::builder::{self, MediaItem, PackBudget, PayloadPacker};
use saucery_core::domain::UserId;
use saucery_core::fetch::pixiv::{self, Artwork, IllustMeta, UgoiraMeta};
use saucery_core::matcher::LinkMatch;
use saucery_core::payload::{delete_button, Attachment, ReplyPayload};

use crate::relay::{self, DiscordEndpoint};
use crate::router::{upload_tier, AppState};

type Relay = saucery_core::relay::WebhookRelay<DiscordEndpoint>;

pub async fn handle(
    ctx: &Context,
    msg: &Message,
    link: &LinkMatch,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    msg.react(&ctx.http, '⌛').await?;

    let relay = relay::open(ctx, msg).await?;
    let budget = PackBudget::for_tier(upload_tier(ctx, msg.guild_id));

    for id in &link.ids {
        info!("fetching artwork {id}");
        match state.pixiv.get_artwork(id).await? {
            Artwork::Illust(meta) => send_illust(&state, &relay, msg, &meta, budget).await?,
            Artwork::Ugoira(meta, frames) => {
                send_ugoira(&state, &relay, msg, &meta, &frames).await?
            }
        }
    }

    relay.destroy().await?;
    Ok(())
}

/// Stream page downloads through the packer, publishing each payload as it
/// finalizes so large sets never sit fully buffered.
async fn send_illust(
    state: &AppState,
    relay: &Relay,
    msg: &Message,
    meta: &IllustMeta,
    budget: PackBudget,
) -> anyhow::Result<()> {
    let created = meta.created_at();
    let mut packer = PayloadPacker::new(budget);
    let mut lead_sent = false;

    info!("downloading {} page(s)", meta.page_count);
    for url in pixiv::page_urls(meta) {
        let bytes = state.pixiv.download(&url).await?;
        let name = pixiv::file_name(&url).to_string();

        let item = MediaItem {
            embed: builder::pixiv_embed(&name, created),
            attachment: Attachment::new(name, bytes),
        };
        if let Some(payload) = packer.push(item) {
            send_payload(relay, msg, meta, payload, &mut lead_sent).await?;
        }
    }

    for payload in packer.finish() {
        send_payload(relay, msg, meta, payload, &mut lead_sent).await?;
    }

    Ok(())
}

/// The first media-bearing payload carries the original message text, the
/// artwork metadata and the delete control.
async fn send_payload(
    relay: &Relay,
    msg: &Message,
    meta: &IllustMeta,
    mut payload: ReplyPayload,
    lead_sent: &mut bool,
) -> anyhow::Result<()> {
    if !*lead_sent && !payload.embeds.is_empty() {
        builder::decorate_pixiv_lead(&mut payload.embeds[0], meta);
        payload.content = Some(msg.content.clone());
        payload.components = vec![delete_button(UserId(msg.author.id.get()))];
        *lead_sent = true;
    }

    relay.send(payload).await?;
    Ok(())
}

async fn send_ugoira(
    state: &AppState,
    relay: &Relay,
    msg: &Message,
    meta: &IllustMeta,
    frames: &UgoiraMeta,
) -> anyhow::Result<()> {
    info!("transcoding ugoira {}", meta.id);
    let file = pixiv::transcode_ugoira(&state.pixiv, &meta.id, frames, &state.cfg.ffmpeg_path).await?;

    let payload = ReplyPayload {
        content: Some(msg.content.clone()),
        attachments: vec![file],
        components: vec![delete_button(UserId(msg.author.id.get()))],
        ..ReplyPayload::default()
    };
    relay.send(payload).await?;
    Ok(())
}
