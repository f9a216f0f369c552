//! Gateway event handler: classify each inbound event, tag it with a
//! request id and hand it to the matching dispatch-table entry. Handler
//! errors are logged and never propagate to the gateway task.

use std::sync::Arc;

use serenity::all::{
    Command, ComponentInteractionDataKind, Context, EventHandler, Interaction, Message, Ready,
};
use serenity::async_trait;
use tracing::{error, info, Instrument};

use saucery_core::{control, matcher};

use crate::router::{AppState, Router};
use crate::{commands, handlers};

pub struct Handler {
    state: Arc<AppState>,
    router: Router,
}

impl Handler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            router: Router::new(),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        // Never react to other bots or our own webhook output.
        if msg.author.bot || msg.webhook_id.is_some() {
            return;
        }

        let Some(link) = matcher::find_links(&msg.content) else {
            return;
        };

        let span = tracing::info_span!(
            "message",
            id = %uuid::Uuid::new_v4(),
            platform = ?link.platform
        );
        let state = self.state.clone();

        async move {
            info!("found {:?} content", link.platform);
            if let Err(err) = handlers::dispatch(&ctx, &msg, &link, state).await {
                error!("handler failed: {err:#}");
            }
        }
        .instrument(span)
        .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                let Some(handler) = self.router.command(&command.data.name) else {
                    return;
                };

                let span = tracing::info_span!(
                    "command",
                    id = %uuid::Uuid::new_v4(),
                    name = %command.data.name
                );
                let state = self.state.clone();

                async move {
                    if let Err(err) = handler(&ctx, &command, state).await {
                        error!("command failed: {err:#}");
                    }
                }
                .instrument(span)
                .await;
            }
            Interaction::Component(component) => {
                if !matches!(component.data.kind, ComponentInteractionDataKind::Button) {
                    return;
                }

                let (key, arg) = {
                    let control = control::parse(&component.data.custom_id);
                    (control.key.to_string(), control.arg.map(str::to_string))
                };
                let Some(handler) = self.router.button(&key) else {
                    return;
                };

                let span = tracing::info_span!(
                    "button",
                    id = %uuid::Uuid::new_v4(),
                    key = %key
                );
                let state = self.state.clone();

                async move {
                    if let Err(err) = handler(&ctx, &component, arg.as_deref(), state).await {
                        error!("button failed: {err:#}");
                    }
                }
                .instrument(span)
                .await;
            }
            _ => {}
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("logged in as {}", ready.user.name);
        info!("guilds: {}", ready.guilds.len());

        if let Err(err) = Command::set_global_commands(&ctx.http, commands::create_commands()).await
        {
            error!("failed to register commands: {err}");
        }
    }
}
