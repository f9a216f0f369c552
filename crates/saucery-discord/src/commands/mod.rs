//! Slash and context-menu commands.

use serenity::all::{
    CommandInteraction, CommandOptionType, CommandType, Context, CreateCommand,
    CreateCommandOption, ResolvedValue,
};

use saucery_core::payload::{Embed, EmbedAuthor};

pub mod dms;
pub mod pixiv;
pub mod sauce;
pub mod sauce_ctx;

pub const RED: u32 = 0xED4245;
pub const GREEN: u32 = 0x57F287;

/// Everything registered globally on ready.
pub fn create_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("sauce")
            .description("Get sauce for a link.")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "link",
                    "The link to the image.",
                )
                .required(true),
            ),
        CreateCommand::new("pixiv")
            .description("Fetch a Pixiv artwork by id.")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "id", "Pixiv ID")
                    .required(true),
            ),
        CreateCommand::new("Get Sauce").kind(CommandType::Message),
        CreateCommand::new("Send to DMs").kind(CommandType::Message),
    ]
}

pub fn option_str(cmd: &CommandInteraction, name: &str) -> Option<String> {
    cmd.data
        .options()
        .into_iter()
        .find(|o| o.name == name)
        .and_then(|o| match o.value {
            ResolvedValue::String(s) => Some(s.to_string()),
            _ => None,
        })
}

/// Embed authored as the bot itself, for command status replies.
pub fn bot_embed(ctx: &Context, color: u32) -> Embed {
    let (name, face) = {
        let user = ctx.cache.current_user();
        (user.name.clone(), user.face())
    };
    Embed::new()
        .color(color)
        .author(EmbedAuthor::new(name).icon_url(face))
}

pub fn no_sauce_embed(ctx: &Context) -> Embed {
    bot_embed(ctx, RED).title("No sauce found!")
}
