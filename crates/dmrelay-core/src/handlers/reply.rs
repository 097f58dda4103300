use tracing::{info, warn};

use crate::{
    commands::{parse_reply, ReplyParseError},
    domain::{ChannelId, User, UserId},
    messaging::types::IncomingMessage,
    router::Relay,
    Result,
};

pub const USAGE_TEXT: &str = "Usage: `!reply <user_id> <your message>`\n\
Example: `!reply 123456789012345678 Hey, I got your DM!`";
pub const INVALID_USER_ID_TEXT: &str = "❌ Invalid user ID.";
pub const DMS_DISABLED_TEXT: &str = "❌ I can't DM that user (they may have DMs disabled).";

/// `!reply <user_id> <body>` in the relay channel: DM the body to the user.
///
/// Every failure is answered in the relay channel so the owner knows what happened.
pub async fn dispatch_reply(relay: &Relay, msg: &IncomingMessage) -> Result<()> {
    let channel = msg.channel.id;

    let cmd = match parse_reply(&msg.content) {
        Ok(cmd) => cmd,
        Err(ReplyParseError::MissingArguments) => {
            return say(relay, channel, USAGE_TEXT).await;
        }
        Err(ReplyParseError::InvalidUserId(_)) => {
            return say(relay, channel, INVALID_USER_ID_TEXT).await;
        }
    };

    let user = match resolve_user(relay, cmd.user_id).await {
        Ok(user) => user,
        Err(e) => {
            info!("Reply target {} unresolved: {e}", cmd.user_id);
            return say(relay, channel, &format!("❌ Could not fetch user: {}", e.detail())).await;
        }
    };

    let text = format!(
        "📨 Message from **{}**:\n{}",
        relay.cfg.owner_name, cmd.body
    );
    match relay.messenger.send_dm(user.id, &text).await {
        Ok(_) => {
            info!("Sent reply to {}", user.label());
            say(relay, channel, &format!("✅ Sent reply to {}", user.label())).await
        }
        Err(e) if e.is_forbidden() => {
            info!("Reply to {} refused: {e}", user.label());
            say(relay, channel, DMS_DISABLED_TEXT).await
        }
        Err(e) => {
            warn!("Reply to {} failed: {e}", user.label());
            say(relay, channel, &format!("❌ Failed to send reply: {}", e.detail())).await
        }
    }
}

/// Cache first, then the network.
async fn resolve_user(relay: &Relay, user_id: UserId) -> Result<User> {
    if let Some(user) = relay.messenger.cached_user(user_id).await {
        return Ok(user);
    }
    relay.messenger.fetch_user(user_id).await
}

async fn say(relay: &Relay, channel: ChannelId, text: &str) -> Result<()> {
    relay.messenger.send_text(channel, text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;
    use std::sync::Arc;

    async fn run(messenger: FakeMessenger, text: &str) -> Arc<FakeMessenger> {
        let messenger = Arc::new(messenger);
        let relay = relay(messenger.clone());
        dispatch_reply(&relay, &in_channel(RELAY, user(1, "Vel"), text))
            .await
            .unwrap();
        messenger
    }

    #[tokio::test]
    async fn missing_arguments_get_usage_and_no_lookup() {
        for text in ["!reply", "!reply 111", "!reply    111   "] {
            let messenger = run(FakeMessenger::new(), text).await;
            assert_eq!(
                messenger.calls(),
                vec![Call::Text(RELAY, USAGE_TEXT.to_string())],
                "{text:?}"
            );
        }
    }

    #[tokio::test]
    async fn non_numeric_id_gets_invalid_id_and_no_fetch() {
        let messenger = run(FakeMessenger::new(), "!reply abc hello").await;
        assert_eq!(
            messenger.calls(),
            vec![Call::Text(RELAY, INVALID_USER_ID_TEXT.to_string())]
        );
    }

    #[tokio::test]
    async fn cached_user_skips_the_network() {
        let messenger = run(
            FakeMessenger::new().with_cached(user(111, "Ann")),
            "!reply 111 On it!",
        )
        .await;

        let calls = messenger.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::FetchUser(_))));
        assert_eq!(
            calls.last(),
            Some(&Call::Text(RELAY, "✅ Sent reply to Ann (111)".to_string()))
        );
    }

    #[tokio::test]
    async fn unknown_user_reports_fetch_failure_without_dm() {
        let messenger = run(FakeMessenger::new(), "!reply 999 hi").await;

        let calls = messenger.calls();
        assert_eq!(calls[..2], [Call::CachedUser(UserId(999)), Call::FetchUser(UserId(999))]);
        let sends = messenger.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(
            sends[0],
            Call::Text(
                RELAY,
                "❌ Could not fetch user: 404 Not Found (error code: 10013): Unknown User"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn closed_dms_are_reported_distinctly() {
        let messenger = run(
            FakeMessenger::new()
                .with_remote(user(111, "Ann"))
                .with_dms_closed(UserId(111)),
            "!reply 111 hi",
        )
        .await;

        assert_eq!(
            messenger.sends(),
            vec![Call::Text(RELAY, DMS_DISABLED_TEXT.to_string())]
        );
    }

    #[tokio::test]
    async fn other_delivery_failures_are_reported_too() {
        let messenger = run(
            FakeMessenger::new()
                .with_remote(user(111, "Ann"))
                .with_dms_broken(UserId(111)),
            "!reply 111 hi",
        )
        .await;

        assert_eq!(
            messenger.sends(),
            vec![Call::Text(
                RELAY,
                "❌ Failed to send reply: 500 Internal Server Error".to_string()
            )]
        );
    }
}
