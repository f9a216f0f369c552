//! Platform-agnostic outgoing message model.
//!
//! Handlers build these descriptors; the adapter converts them to SDK
//! builders right before the wire.

use std::fmt;

use crate::domain::UserId;

/// A rich-embed descriptor.
#[derive(Clone, Debug, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub author: Option<EmbedAuthor>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub footer: Option<EmbedFooter>,
    /// Unix seconds; rendered as the embed timestamp.
    pub timestamp: Option<i64>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn author(mut self, author: EmbedAuthor) -> Self {
        self.author = Some(author);
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn footer(mut self, footer: EmbedFooter) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn timestamp(mut self, unix_seconds: i64) -> Self {
        self.timestamp = Some(unix_seconds);
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

#[derive(Clone, Debug)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

impl EmbedAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            icon_url: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn icon_url(mut self, url: impl Into<String>) -> Self {
        self.icon_url = Some(url.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

impl EmbedFooter {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon_url: None,
        }
    }

    pub fn icon_url(mut self, url: impl Into<String>) -> Self {
        self.icon_url = Some(url.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// An in-memory file attachment.
#[derive(Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Success,
    Danger,
}

#[derive(Clone, Debug)]
pub struct Button {
    pub custom_id: String,
    pub label: Option<String>,
    pub emoji: Option<String>,
    pub style: ButtonStyle,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: None,
            emoji: None,
            style,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

/// One action row of buttons.
#[derive(Clone, Debug)]
pub struct ControlRow {
    pub buttons: Vec<Button>,
}

pub fn row(buttons: Vec<Button>) -> ControlRow {
    ControlRow { buttons }
}

/// The delete control attached to relayed messages. The original author's
/// id rides along in the control id.
pub fn delete_button(author_id: UserId) -> ControlRow {
    row(vec![Button::new(
        format!("msg-delete|{}", author_id.0),
        ButtonStyle::Danger,
    )
    .emoji("🗑️")])
}

/// One outgoing message: text, embeds, binary attachments and controls.
#[derive(Clone, Debug, Default)]
pub struct ReplyPayload {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub attachments: Vec<Attachment>,
    pub components: Vec<ControlRow>,
}

impl ReplyPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_button_embeds_author_id() {
        let row = delete_button(UserId(1234));
        assert_eq!(row.buttons.len(), 1);
        assert_eq!(row.buttons[0].custom_id, "msg-delete|1234");
        assert_eq!(row.buttons[0].style, ButtonStyle::Danger);
    }
}
