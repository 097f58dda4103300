//! Event handlers. Each one owns its failure reporting; the router only logs
//! what escapes (failed sends).

use tracing::debug;

use crate::{
    commands::{parse_command, COMMAND_PREFIX, CONTACT_COMMAND},
    messaging::types::IncomingMessage,
    router::Relay,
    Result,
};

pub mod contact;
pub mod forward;
pub mod reply;

#[cfg(test)]
pub(crate) mod testing;

/// Generic `!name args` processing for messages no other route claimed.
pub async fn process_command(relay: &Relay, msg: &IncomingMessage) -> Result<()> {
    let Some((name, _args)) = parse_command(&msg.content, COMMAND_PREFIX) else {
        return Ok(());
    };

    match name {
        CONTACT_COMMAND => contact::contact(relay, msg).await,
        other => {
            debug!("Ignoring unknown command {COMMAND_PREFIX}{other}");
            Ok(())
        }
    }
}
