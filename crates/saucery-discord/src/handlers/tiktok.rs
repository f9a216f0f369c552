use std::sync::Arc;

use serenity::all::{Context, Message};
use tracing::info;

use saucery_core::domain::UserId;
use saucery_core::matcher::{self, Platform};
use saucery_core::payload::{delete_button, ReplyPayload};

use crate::relay;
use crate::router::AppState;

pub fn rewrite(content: &str) -> String {
    matcher::pattern(Platform::Tiktok)
        .replace_all(content, "https://www.vxtiktok.com/@$1/video/$2")
        .into_owned()
}

pub async fn handle(ctx: &Context, msg: &Message, _state: Arc<AppState>) -> anyhow::Result<()> {
    let content = rewrite(&msg.content);
    let relay = relay::open(ctx, msg).await?;
    info!("replaced tiktok links");

    relay
        .send(ReplyPayload {
            content: Some(content),
            components: vec![delete_button(UserId(msg.author.id.get()))],
            ..ReplyPayload::default()
        })
        .await?;
    relay.destroy().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_to_proxy_domain() {
        assert_eq!(
            rewrite("see https://www.tiktok.com/@someone/video/7012345 !"),
            "see https://www.vxtiktok.com/@someone/video/7012345 !"
        );
    }
}
