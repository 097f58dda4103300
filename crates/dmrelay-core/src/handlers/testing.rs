//! In-memory [`MessagingPort`] recording every call, for handler tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    config::Config,
    domain::{ChannelId, MessageId, MessageRef, User, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChannelRef, Embed, IncomingMessage},
    },
    router::Relay,
    Result,
};

pub const RELAY: ChannelId = ChannelId(555);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Channel(ChannelId),
    Text(ChannelId, String),
    Embed(ChannelId, Embed),
    Dm(UserId, String),
    CachedUser(UserId),
    FetchUser(UserId),
}

impl Call {
    pub fn is_send(&self) -> bool {
        matches!(self, Call::Text(..) | Call::Embed(..) | Call::Dm(..))
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u64>,
    channels: HashSet<ChannelId>,
    cache: HashMap<UserId, User>,
    remote: HashMap<UserId, User>,
    dms_closed: HashSet<UserId>,
    dms_broken: HashSet<UserId>,
}

impl FakeMessenger {
    /// A messenger that can see the relay channel.
    pub fn new() -> Self {
        Self::default().with_channel(RELAY)
    }

    pub fn with_channel(mut self, id: ChannelId) -> Self {
        self.channels.insert(id);
        self
    }

    pub fn without_channel(mut self, id: ChannelId) -> Self {
        self.channels.remove(&id);
        self
    }

    pub fn with_cached(mut self, user: User) -> Self {
        self.cache.insert(user.id, user);
        self
    }

    pub fn with_remote(mut self, user: User) -> Self {
        self.remote.insert(user.id, user);
        self
    }

    pub fn with_dms_closed(mut self, id: UserId) -> Self {
        self.dms_closed.insert(id);
        self
    }

    pub fn with_dms_broken(mut self, id: UserId) -> Self {
        self.dms_broken.insert(id);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_send).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn alloc(&self, channel_id: ChannelId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        MessageRef {
            channel_id,
            message_id: MessageId(*guard),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn channel(&self, channel_id: ChannelId) -> Result<Option<ChannelId>> {
        self.record(Call::Channel(channel_id));
        Ok(self.channels.contains(&channel_id).then_some(channel_id))
    }

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        self.record(Call::Text(channel_id, text.to_string()));
        Ok(self.alloc(channel_id))
    }

    async fn send_embed(&self, channel_id: ChannelId, embed: &Embed) -> Result<MessageRef> {
        self.record(Call::Embed(channel_id, embed.clone()));
        Ok(self.alloc(channel_id))
    }

    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<MessageRef> {
        if self.dms_closed.contains(&user_id) {
            return Err(Error::Forbidden(
                "403 Forbidden (error code: 50007): Cannot send messages to this user".into(),
            ));
        }
        if self.dms_broken.contains(&user_id) {
            return Err(Error::External("500 Internal Server Error".into()));
        }
        self.record(Call::Dm(user_id, text.to_string()));
        Ok(self.alloc(ChannelId(user_id.0)))
    }

    async fn cached_user(&self, user_id: UserId) -> Option<User> {
        self.record(Call::CachedUser(user_id));
        self.cache.get(&user_id).cloned()
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<User> {
        self.record(Call::FetchUser(user_id));
        self.remote.get(&user_id).cloned().ok_or_else(|| {
            Error::NotFound("404 Not Found (error code: 10013): Unknown User".into())
        })
    }
}

pub fn config() -> Config {
    Config {
        discord_bot_token: "token".to_string(),
        relay_channel_id: RELAY,
        owner_name: "Vel".to_string(),
    }
}

pub fn relay(messenger: Arc<FakeMessenger>) -> Relay {
    Relay::new(Arc::new(config()), messenger)
}

pub fn user(id: u64, name: &str) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        bot: false,
    }
}

pub fn dm(author: User, content: &str) -> IncomingMessage {
    IncomingMessage {
        channel: ChannelRef {
            id: ChannelId(9000 + author.id.0),
            private: true,
        },
        author,
        content: content.to_string(),
        attachments: vec![],
    }
}

pub fn in_channel(channel: ChannelId, author: User, content: &str) -> IncomingMessage {
    IncomingMessage {
        channel: ChannelRef {
            id: channel,
            private: false,
        },
        author,
        content: content.to_string(),
        attachments: vec![],
    }
}
