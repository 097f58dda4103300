//! Text command parsing: the `!reply` trigger and the generic `!name args` form.

use crate::domain::UserId;

pub const COMMAND_PREFIX: &str = "!";
pub const REPLY_TRIGGER: &str = "!reply";
pub const CONTACT_COMMAND: &str = "contact";

/// A routed reply typed by the owner in the relay channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyCommand {
    pub user_id: UserId,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyParseError {
    #[error("expected `!reply <user_id> <message>`")]
    MissingArguments,

    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

pub fn is_reply_trigger(text: &str) -> bool {
    text.starts_with(REPLY_TRIGGER)
}

/// Parse `!reply <user_id> <body>`.
///
/// The body is everything after the id token with leading whitespace removed;
/// inner and trailing whitespace are kept as typed.
pub fn parse_reply(text: &str) -> Result<ReplyCommand, ReplyParseError> {
    let [_trigger, id_token, body] = split_tokens::<3>(text);
    let (Some(id_token), Some(body)) = (id_token, body) else {
        return Err(ReplyParseError::MissingArguments);
    };

    let user_id = id_token
        .parse::<u64>()
        .map(UserId)
        .map_err(|_| ReplyParseError::InvalidUserId(id_token.to_string()))?;

    Ok(ReplyCommand {
        user_id,
        body: body.to_string(),
    })
}

/// Split a prefixed command into `(name, args)`. `None` when `text` is not a command.
pub fn parse_command<'a>(text: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = text.strip_prefix(prefix)?;
    let [name, args] = split_tokens::<2>(rest);
    // `! contact` is not a command: the name must follow the prefix directly.
    let name = name.filter(|n| rest.starts_with(*n))?;
    Some((name, args.unwrap_or("")))
}

/// Split on whitespace runs into at most `N` tokens; the last one keeps the
/// untouched remainder of the line.
fn split_tokens<const N: usize>(text: &str) -> [Option<&str>; N] {
    let mut out = [None; N];
    let mut rest = text.trim_start();
    for (i, slot) in out.iter_mut().enumerate() {
        if rest.is_empty() {
            break;
        }
        if i + 1 == N {
            *slot = Some(rest);
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        *slot = Some(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    out
}
