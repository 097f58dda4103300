//! Per-event routing: classify once, pick exactly one handler.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    commands::is_reply_trigger,
    config::Config,
    domain::User,
    handlers,
    messaging::{port::MessagingPort, types::IncomingMessage},
};

/// Where a message was posted, relative to the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Private,
    Relay,
    Other,
}

/// The single handling path chosen for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Automated author; nothing is sent.
    Ignore,
    ForwardDm,
    DispatchReply,
    /// Generic `!command` processing.
    Command,
}

pub fn classify(cfg: &Config, msg: &IncomingMessage) -> ChannelKind {
    if msg.is_private() {
        ChannelKind::Private
    } else if msg.channel.id == cfg.relay_channel_id {
        ChannelKind::Relay
    } else {
        ChannelKind::Other
    }
}

pub fn route(cfg: &Config, msg: &IncomingMessage) -> Route {
    if msg.author.bot {
        return Route::Ignore;
    }
    match classify(cfg, msg) {
        ChannelKind::Private => Route::ForwardDm,
        ChannelKind::Relay if is_reply_trigger(&msg.content) => Route::DispatchReply,
        ChannelKind::Relay | ChannelKind::Other => Route::Command,
    }
}

/// The relay core. Stateless across events; safe to share between tasks.
pub struct Relay {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
}

impl Relay {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self { cfg, messenger }
    }

    /// Session is up: announce ourselves in the relay channel.
    pub async fn on_ready(&self, me: &User) {
        info!("Logged in as {} (ID: {})", me.name, me.id);
        info!("Relay bot is running.");

        match self.messenger.channel(self.cfg.relay_channel_id).await {
            Ok(Some(channel_id)) => {
                let text = format!("✅ {}'s relay bot is now online.", self.cfg.owner_name);
                if let Err(e) = self.messenger.send_text(channel_id, &text).await {
                    warn!("Failed to post online announcement: {e}");
                }
            }
            Ok(None) => warn!("Relay channel not found. Check RELAY_CHANNEL_ID."),
            Err(e) => warn!("Relay channel lookup failed: {e}"),
        }
    }

    /// Handle one incoming message. Errors stop here; they are logged, never returned.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Route {
        let route = route(&self.cfg, msg);

        let result = match route {
            Route::Ignore => Ok(()),
            Route::ForwardDm => handlers::forward::forward_dm(self, msg).await,
            Route::DispatchReply => handlers::reply::dispatch_reply(self, msg).await,
            Route::Command => handlers::process_command(self, msg).await,
        };

        if let Err(e) = result {
            warn!(
                route = ?route,
                author = %msg.author.id,
                channel = %msg.channel.id,
                "message handling failed: {e}"
            );
        }
        route
    }
}
