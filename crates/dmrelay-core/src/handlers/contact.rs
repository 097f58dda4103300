use crate::{messaging::types::IncomingMessage, router::Relay, Result};

/// `!contact`: tell people how to reach the owner.
pub async fn contact(relay: &Relay, msg: &IncomingMessage) -> Result<()> {
    let text = format!(
        "To contact **{}**, just DM me directly and I'll relay your message 💬",
        relay.cfg.owner_name
    );
    relay.messenger.send_text(msg.channel.id, &text).await?;
    Ok(())
}
