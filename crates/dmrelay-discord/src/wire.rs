//! Discord JSON shapes (REST responses and gateway payloads) and their
//! conversion into core types.

use serde::Deserialize;
use serde_json::{json, Value};

use dmrelay_core::{
    domain::{ChannelId, MessageId, User, UserId},
    errors::Error,
    messaging::types::{ChannelRef, Embed, IncomingMessage},
    Result,
};

#[derive(Debug, Deserialize)]
pub struct RawUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

impl RawUser {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: UserId(parse_snowflake(&self.id)?),
            name: self.username,
            bot: self.bot,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawAttachment {
    pub url: String,
}

/// `MESSAGE_CREATE` dispatch data (subset).
#[derive(Debug, Deserialize)]
pub struct RawMessage {
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub author: RawUser,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

impl RawMessage {
    /// Messages without a guild are DMs (bots are never in group DMs).
    pub fn into_incoming(self) -> Result<IncomingMessage> {
        Ok(IncomingMessage {
            channel: ChannelRef {
                id: ChannelId(parse_snowflake(&self.channel_id)?),
                private: self.guild_id.is_none(),
            },
            author: self.author.into_user()?,
            content: self.content,
            attachments: self.attachments.into_iter().map(|a| a.url).collect(),
        })
    }
}

/// Response of message create / channel get / DM open.
#[derive(Debug, Deserialize)]
pub struct RawSnowflakeObject {
    pub id: String,
}

impl RawSnowflakeObject {
    pub fn channel_id(&self) -> Result<ChannelId> {
        parse_snowflake(&self.id).map(ChannelId)
    }

    pub fn message_id(&self) -> Result<MessageId> {
        parse_snowflake(&self.id).map(MessageId)
    }
}

/// Discord's JSON error body.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: u64,
    pub message: String,
}

/// 429 body; `retry_after` is in seconds.
#[derive(Debug, Deserialize)]
pub struct RateLimited {
    pub retry_after: f64,
}

#[derive(Debug, Deserialize)]
pub struct GatewayBot {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct Ready {
    pub user: RawUser,
}

pub fn parse_snowflake(s: &str) -> Result<u64> {
    s.parse::<u64>()
        .map_err(|_| Error::External(format!("invalid snowflake: {s:?}")))
}

pub fn embed_json(embed: &Embed) -> Value {
    let fields: Vec<Value> = embed
        .fields
        .iter()
        .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
        .collect();

    let mut out = json!({
        "title": embed.title,
        "description": embed.description,
        "fields": fields,
    });
    if let Some(color) = embed.color {
        out["color"] = json!(color);
    }
    out
}
