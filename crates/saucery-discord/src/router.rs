//! Shared state and the dispatch tables, built once at startup.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serenity::all::{CommandInteraction, ComponentInteraction, Context, GuildId, PremiumTier};

use saucery_core::config::Config;
use saucery_core::domain::UploadTier;
use saucery_core::fetch::pixiv::PixivClient;
use saucery_core::fetch::saucenao::SauceClient;
use saucery_core::fetch::twitter::TwitterClient;
use saucery_core::pagination::PageRegistry;

use crate::{buttons, commands};

pub struct AppState {
    pub cfg: Arc<Config>,
    pub pixiv: PixivClient,
    pub twitter: TwitterClient,
    pub sauce: SauceClient,
    pub pages: PageRegistry,
}

impl AppState {
    pub fn new(cfg: Arc<Config>) -> Self {
        let http = reqwest::Client::new();

        Self {
            pixiv: PixivClient::new(
                http.clone(),
                cfg.pixiv_session.clone(),
                cfg.pixiv_user_id.clone(),
            ),
            twitter: TwitterClient::new(http.clone(), cfg.twitter_bearer.clone()),
            sauce: SauceClient::new(http, cfg.sauce_key.clone()),
            pages: PageRegistry::new(),
            cfg,
        }
    }
}

/// Attachment ceiling for the guild the event came from; DMs and uncached
/// guilds get the base tier.
pub fn upload_tier(ctx: &Context, guild_id: Option<GuildId>) -> UploadTier {
    let Some(tier) = guild_id.and_then(|id| ctx.cache.guild(id).map(|g| g.premium_tier)) else {
        return UploadTier::None;
    };

    match tier {
        PremiumTier::Tier1 => UploadTier::Tier1,
        PremiumTier::Tier2 => UploadTier::Tier2,
        PremiumTier::Tier3 => UploadTier::Tier3,
        _ => UploadTier::None,
    }
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

pub type CommandHandler =
    for<'a> fn(&'a Context, &'a CommandInteraction, Arc<AppState>) -> HandlerFuture<'a>;

pub type ButtonHandler = for<'a> fn(
    &'a Context,
    &'a ComponentInteraction,
    Option<&'a str>,
    Arc<AppState>,
) -> HandlerFuture<'a>;

/// Dispatch tables keyed by command name and control-id prefix. Unknown
/// keys are ignored by the event handler; some other bot may own them.
pub struct Router {
    commands: HashMap<&'static str, CommandHandler>,
    buttons: HashMap<&'static str, ButtonHandler>,
}

fn sauce_cmd<'a>(
    ctx: &'a Context,
    cmd: &'a CommandInteraction,
    state: Arc<AppState>,
) -> HandlerFuture<'a> {
    Box::pin(commands::sauce::run(ctx, cmd, state))
}

fn pixiv_cmd<'a>(
    ctx: &'a Context,
    cmd: &'a CommandInteraction,
    state: Arc<AppState>,
) -> HandlerFuture<'a> {
    Box::pin(commands::pixiv::run(ctx, cmd, state))
}

fn sauce_ctx_cmd<'a>(
    ctx: &'a Context,
    cmd: &'a CommandInteraction,
    state: Arc<AppState>,
) -> HandlerFuture<'a> {
    Box::pin(commands::sauce_ctx::run(ctx, cmd, state))
}

fn dms_cmd<'a>(
    ctx: &'a Context,
    cmd: &'a CommandInteraction,
    state: Arc<AppState>,
) -> HandlerFuture<'a> {
    Box::pin(commands::dms::run(ctx, cmd, state))
}

fn delete_btn<'a>(
    ctx: &'a Context,
    component: &'a ComponentInteraction,
    arg: Option<&'a str>,
    state: Arc<AppState>,
) -> HandlerFuture<'a> {
    Box::pin(buttons::delete::run(ctx, component, arg, state))
}

fn paginate_btn<'a>(
    ctx: &'a Context,
    component: &'a ComponentInteraction,
    arg: Option<&'a str>,
    state: Arc<AppState>,
) -> HandlerFuture<'a> {
    Box::pin(buttons::pages::run(ctx, component, arg, state))
}

impl Router {
    pub fn new() -> Self {
        let mut commands: HashMap<&'static str, CommandHandler> = HashMap::new();
        commands.insert("sauce", sauce_cmd);
        commands.insert("pixiv", pixiv_cmd);
        commands.insert("Get Sauce", sauce_ctx_cmd);
        commands.insert("Send to DMs", dms_cmd);

        let mut buttons: HashMap<&'static str, ButtonHandler> = HashMap::new();
        buttons.insert("msg-delete", delete_btn);
        buttons.insert(saucery_core::pagination::CONTROL_PREFIX, paginate_btn);

        Self { commands, buttons }
    }

    pub fn command(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).copied()
    }

    pub fn button(&self, key: &str) -> Option<ButtonHandler> {
        self.buttons.get(key).copied()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_know_every_registered_key() {
        let router = Router::new();
        for name in ["sauce", "pixiv", "Get Sauce", "Send to DMs"] {
            assert!(router.command(name).is_some(), "missing command {name}");
        }
        for key in ["msg-delete", "paginate"] {
            assert!(router.button(key).is_some(), "missing button {key}");
        }
        assert!(router.command("unknown").is_none());
        assert!(router.button("someone-elses-button").is_none());
    }
}
