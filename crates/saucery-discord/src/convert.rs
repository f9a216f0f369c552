//! `ReplyPayload` → serenity builder conversion, done once right before
//! the wire.

use serenity::all::{
    ButtonStyle as DiscordButtonStyle, Colour, CreateActionRow, CreateAttachment, CreateButton,
    CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, EditAttachments, EditInteractionResponse,
    EditMessage, ExecuteWebhook, ReactionType, Timestamp,
};

use saucery_core::payload::{Attachment, Button, ButtonStyle, ControlRow, Embed, ReplyPayload};

pub fn create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();

    if let Some(title) = &embed.title {
        builder = builder.title(title.clone());
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url.clone());
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description.clone());
    }
    if let Some(color) = embed.color {
        builder = builder.colour(Colour::new(color));
    }
    if let Some(author) = &embed.author {
        let mut a = CreateEmbedAuthor::new(author.name.clone());
        if let Some(url) = &author.url {
            a = a.url(url.clone());
        }
        if let Some(icon) = &author.icon_url {
            a = a.icon_url(icon.clone());
        }
        builder = builder.author(a);
    }
    if let Some(image) = &embed.image {
        builder = builder.image(image.clone());
    }
    if let Some(thumbnail) = &embed.thumbnail {
        builder = builder.thumbnail(thumbnail.clone());
    }
    if let Some(footer) = &embed.footer {
        let mut f = CreateEmbedFooter::new(footer.text.clone());
        if let Some(icon) = &footer.icon_url {
            f = f.icon_url(icon.clone());
        }
        builder = builder.footer(f);
    }
    if let Some(unix) = embed.timestamp {
        if let Ok(ts) = Timestamp::from_unix_timestamp(unix) {
            builder = builder.timestamp(ts);
        }
    }
    for field in &embed.fields {
        builder = builder.field(field.name.clone(), field.value.clone(), field.inline);
    }

    builder
}

fn button(b: &Button) -> CreateButton {
    let style = match b.style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Success => DiscordButtonStyle::Success,
        ButtonStyle::Danger => DiscordButtonStyle::Danger,
    };

    let mut builder = CreateButton::new(b.custom_id.clone()).style(style);
    if let Some(label) = &b.label {
        builder = builder.label(label.clone());
    }
    if let Some(emoji) = &b.emoji {
        builder = builder.emoji(ReactionType::Unicode(emoji.clone()));
    }
    builder
}

pub fn action_row(row: &ControlRow) -> CreateActionRow {
    CreateActionRow::Buttons(row.buttons.iter().map(button).collect())
}

pub fn attachment(a: &Attachment) -> CreateAttachment {
    CreateAttachment::bytes(a.bytes.clone(), a.filename.clone())
}

fn embeds(payload: &ReplyPayload) -> Vec<CreateEmbed> {
    payload.embeds.iter().map(create_embed).collect()
}

fn rows(payload: &ReplyPayload) -> Vec<CreateActionRow> {
    payload.components.iter().map(action_row).collect()
}

pub fn execute_webhook(payload: &ReplyPayload) -> ExecuteWebhook {
    let mut builder = ExecuteWebhook::new().embeds(embeds(payload));

    if let Some(content) = &payload.content {
        builder = builder.content(content.clone());
    }
    for a in &payload.attachments {
        builder = builder.add_file(attachment(a));
    }
    if !payload.components.is_empty() {
        builder = builder.components(rows(payload));
    }

    builder
}

/// Full in-place replacement of a message, attachments included.
pub fn edit_message(payload: &ReplyPayload) -> EditMessage {
    let mut new_attachments = EditAttachments::new();
    for a in &payload.attachments {
        new_attachments = new_attachments.add(attachment(a));
    }

    EditMessage::new()
        .content(payload.content.clone().unwrap_or_default())
        .embeds(embeds(payload))
        .components(rows(payload))
        .attachments(new_attachments)
}

pub fn edit_response(payload: &ReplyPayload) -> EditInteractionResponse {
    let mut builder = EditInteractionResponse::new()
        .content(payload.content.clone().unwrap_or_default())
        .embeds(embeds(payload))
        .components(rows(payload));

    for a in &payload.attachments {
        builder = builder.new_attachment(attachment(a));
    }

    builder
}

