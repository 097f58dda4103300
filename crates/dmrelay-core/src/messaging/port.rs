use async_trait::async_trait;

use crate::{
    domain::{ChannelId, MessageRef, User, UserId},
    messaging::types::Embed,
    Result,
};

/// The live platform session, as the relay sees it.
///
/// The relay calls each operation once and never retries; rate limiting and
/// any retry on it are the adapter's business. The relay is handed one of
/// these at construction and never reaches for a global.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Resolve a channel the bot can post to. `Ok(None)` when it does not
    /// exist or the bot cannot see it.
    async fn channel(&self, channel_id: ChannelId) -> Result<Option<ChannelId>>;

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef>;
    async fn send_embed(&self, channel_id: ChannelId, embed: &Embed) -> Result<MessageRef>;

    /// Open (or reuse) the DM channel with `user_id` and post `text` there.
    ///
    /// Fails with [`crate::Error::Forbidden`] when the user does not accept DMs
    /// from the bot.
    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<MessageRef>;

    /// Local lookup only; never touches the network.
    async fn cached_user(&self, user_id: UserId) -> Option<User>;

    /// Network lookup. Fails with [`crate::Error::NotFound`] for unknown ids.
    async fn fetch_user(&self, user_id: UserId) -> Result<User>;
}
