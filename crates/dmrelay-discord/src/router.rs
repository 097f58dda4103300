use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dmrelay_core::{config::Config, messaging::port::MessagingPort, router::Relay};

use crate::{gateway, handlers, DiscordMessenger};

const EVENT_QUEUE: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub messenger: Arc<DiscordMessenger>,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, messenger: Arc<DiscordMessenger>) -> Self {
        let port: Arc<dyn MessagingPort> = messenger.clone();
        let relay = Arc::new(Relay::new(cfg, port));
        Self { messenger, relay }
    }
}

/// Connect to Discord and relay until Ctrl-C or a fatal gateway refusal.
pub async fn run(cfg: Arc<Config>) -> anyhow::Result<()> {
    let messenger = Arc::new(DiscordMessenger::new(cfg.discord_bot_token.clone()));
    let state = Arc::new(AppState::new(cfg.clone(), messenger.clone()));

    info!("Relay channel: {}", cfg.relay_channel_id);
    info!("Owner name: {}", cfg.owner_name);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
            }
            cancel.cancel();
        });
    }

    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE);
    let gateway = tokio::spawn(gateway::run(messenger, tx, cancel.clone()));

    // Events are independent; a slow send in one must not hold up the next.
    while let Some(event) = rx.recv().await {
        let state = state.clone();
        tokio::spawn(handlers::handle_event(state, event));
    }

    gateway.await.context("gateway task panicked")?
}
