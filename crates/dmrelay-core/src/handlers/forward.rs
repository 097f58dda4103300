use tracing::{info, warn};

use crate::{
    messaging::types::{Embed, IncomingMessage},
    router::Relay,
    Result,
};

pub const RELAY_EMBED_TITLE: &str = "New DM to Relay";
pub const RELAY_EMBED_COLOR: u32 = 0x3498DB;
pub const NO_TEXT_PLACEHOLDER: &str = "*no text*";

/// Build the relay-channel post for a DM.
pub fn relay_embed(msg: &IncomingMessage) -> Embed {
    let description = if msg.content.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        msg.content.clone()
    };

    let mut embed = Embed::new(RELAY_EMBED_TITLE, description)
        .with_color(RELAY_EMBED_COLOR)
        .with_field("From", msg.author.label(), false);

    if !msg.attachments.is_empty() {
        embed = embed.with_field("Attachments", msg.attachments.join("\n"), false);
    }
    embed
}

/// DM from a user: post it to the relay channel, then acknowledge to the sender.
///
/// An unresolvable relay channel drops the message without telling the sender.
pub async fn forward_dm(relay: &Relay, msg: &IncomingMessage) -> Result<()> {
    let relay_channel = match relay.messenger.channel(relay.cfg.relay_channel_id).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!("Relay channel not found.");
            return Ok(());
        }
        Err(e) => {
            warn!("Relay channel lookup failed: {e}");
            return Ok(());
        }
    };

    relay
        .messenger
        .send_embed(relay_channel, &relay_embed(msg))
        .await?;
    info!("Relayed DM from {}", msg.author.label());

    let ack = format!(
        "Hi! Your message has been relayed to **{}**. They'll see it soon 💌",
        relay.cfg.owner_name
    );
    relay.messenger.send_text(msg.channel.id, &ack).await?;
    Ok(())
}
