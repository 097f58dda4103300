//! Gateway event handlers.
//!
//! Each event runs on its own task. Handlers only translate: message routing
//! and reply semantics live in `dmrelay-core`.

use std::sync::Arc;

use tracing::debug;

use crate::{gateway::GatewayEvent, router::AppState};

pub async fn handle_event(state: Arc<AppState>, event: GatewayEvent) {
    match event {
        GatewayEvent::Ready(me) => state.relay.on_ready(&me).await,
        GatewayEvent::Message(msg) => {
            state.messenger.remember(&msg.author).await;
            let route = state.relay.handle_message(&msg).await;
            debug!(
                route = ?route,
                author = %msg.author.id,
                channel = %msg.channel.id,
                "message handled"
            );
        }
    }
}
