use crate::domain::{ChannelId, User};

/// Where an incoming message was posted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    /// One-to-one DM channel between the author and the bot.
    pub private: bool,
}

/// Cross-platform incoming message. Produced by the adapter per event.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub author: User,
    pub channel: ChannelRef,
    pub content: String,
    pub attachments: Vec<String>,
}

impl IncomingMessage {
    pub fn is_private(&self) -> bool {
        self.channel.private
    }
}

/// Structured notification (a Discord embed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}
