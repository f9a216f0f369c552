//! Discord adapter (serenity).
//!
//! This crate implements the `saucery-core` ports over the Discord API and
//! routes gateway events into the core handlers.

use std::sync::Arc;

use serenity::all::{Client, GatewayIntents};

use saucery_core::config::Config;

pub mod buttons;
pub mod commands;
pub mod convert;
pub mod events;
pub mod handlers;
pub mod pages;
pub mod relay;
pub mod router;

pub(crate) fn discord_err(e: serenity::Error) -> saucery_core::Error {
    saucery_core::Error::Discord(e.to_string())
}

/// Connect to the gateway and run until the connection dies.
pub async fn run(cfg: Arc<Config>) -> anyhow::Result<()> {
    let state = Arc::new(router::AppState::new(cfg.clone()));

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(events::Handler::new(state))
        .await?;

    client.start().await?;
    Ok(())
}
