use std::sync::Arc;

use serenity::all::{Context, Message};
use tracing::info;

use saucery_core::builder;
use saucery_core::domain::UserId;
use saucery_core::matcher::{self, Platform};
use saucery_core::payload::{delete_button, ReplyPayload};

use crate::relay;
use crate::router::AppState;

pub async fn handle(ctx: &Context, msg: &Message, state: Arc<AppState>) -> anyhow::Result<()> {
    // Give Discord's own link preview a moment to resolve first.
    tokio::time::sleep(state.cfg.embed_wait).await;
    let current = ctx.http.get_message(msg.channel_id, msg.id).await?;

    let matched: Vec<(String, String, String)> = matcher::pattern(Platform::Twitter)
        .captures_iter(&msg.content)
        .map(|caps| {
            (
                caps[0].to_string(),
                caps[1].to_string(),
                caps[2].to_string(),
            )
        })
        .collect();

    if already_embedded(&current, matched.len()) {
        info!("all links already embedded, skipping");
        return Ok(());
    }

    msg.react(&ctx.http, '⌛').await?;
    let relay = relay::open(ctx, msg).await?;

    let mut content = msg.content.clone();
    let mut responses: Vec<ReplyPayload> = Vec::new();
    let mut has_video = false;

    for (link_text, subpath, id) in &matched {
        let tweet = state.twitter.get_tweet(id).await?;

        if tweet.has_video() {
            // Discord can't attach a playable video from an embed; hand the
            // link to the proxy domain instead.
            info!("tweet {id} has video, rewriting link");
            has_video = true;
            content = rewrite_video_link(&content, link_text, subpath, id);
        } else {
            info!("building embeds for tweet {id}");
            responses.push(ReplyPayload {
                embeds: builder::tweet_embeds(&tweet),
                ..ReplyPayload::default()
            });
            // Suppress the default preview on handled links.
            content = content.replace(link_text.as_str(), &format!("<{link_text}>"));
        }
    }

    let components = vec![delete_button(UserId(msg.author.id.get()))];
    let first = if has_video {
        ReplyPayload {
            content: Some(content),
            components,
            ..ReplyPayload::default()
        }
    } else {
        let mut first = if responses.is_empty() {
            ReplyPayload::default()
        } else {
            responses.remove(0)
        };
        first.content = Some(content);
        first.components = components;
        first
    };

    relay.send(first).await?;
    for response in responses {
        relay.send(response).await?;
    }

    relay.destroy().await?;
    Ok(())
}

/// Discord resolved every link itself when each produces an author-bearing
/// embed and none of them is the broken video player.
fn already_embedded(msg: &Message, expecting: usize) -> bool {
    if msg.embeds.iter().any(|e| e.video.is_some()) {
        return false;
    }
    let with_author = msg.embeds.iter().filter(|e| e.author.is_some()).count();
    with_author == expecting
}

fn rewrite_video_link(content: &str, link: &str, subpath: &str, id: &str) -> String {
    content.replace(link, &format!("https://vxtwitter.com/{subpath}/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_links_move_to_the_proxy_domain() {
        let content = "watch https://twitter.com/someone/status/100?s=20";
        let rewritten =
            rewrite_video_link(content, "https://twitter.com/someone/status/100?s=20", "someone/status", "100");
        assert_eq!(rewritten, "watch https://vxtwitter.com/someone/status/100");
    }
}
