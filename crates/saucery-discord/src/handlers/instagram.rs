use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serenity::all::{Context, Message};
use tracing::info;

use saucery_core::domain::UserId;
use saucery_core::payload::{delete_button, ReplyPayload};

use crate::relay;
use crate::router::AppState;

// Swallows everything after the post id so tracking params don't survive
// the rewrite.
fn rewrite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)https?://www\.instagram\.com/p/(\w{11})\S*")
            .expect("valid instagram rewrite pattern")
    })
}

pub fn rewrite(content: &str) -> String {
    rewrite_re()
        .replace_all(content, "https://www.ddinstagram.com/p/$1")
        .into_owned()
}

pub async fn handle(ctx: &Context, msg: &Message, _state: Arc<AppState>) -> anyhow::Result<()> {
    let content = rewrite(&msg.content);
    let relay = relay::open(ctx, msg).await?;
    info!("replaced instagram links");

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
    fn rewrite_drops_tracking_params() {
        assert_eq!(
            rewrite("https://www.instagram.com/p/CaBcDeFgHiJ/?igshid=abc"),
            "https://www.ddinstagram.com/p/CaBcDeFgHiJ"
        );
    }
}
