use std::{env, fs, path::Path};

use crate::{domain::ChannelId, errors::Error, Result};

pub const ENV_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const ENV_RELAY_CHANNEL_ID: &str = "RELAY_CHANNEL_ID";
pub const ENV_OWNER_NAME: &str = "OWNER_NAME";

/// Used in outbound messages when `OWNER_NAME` is not set.
pub const DEFAULT_OWNER_NAME: &str = "Velvit";

/// Typed configuration for the relay. Loaded once at startup and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub discord_bot_token: String,
    pub relay_channel_id: ChannelId,
    pub owner_name: String,
}

impl Config {
    /// Load from the process environment, after merging `./.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let discord_bot_token = get(ENV_BOT_TOKEN).ok_or_else(|| {
            Error::Config(format!("{ENV_BOT_TOKEN} environment variable is required"))
        })?;

        let raw_channel = get(ENV_RELAY_CHANNEL_ID).ok_or_else(|| {
            Error::Config(format!(
                "{ENV_RELAY_CHANNEL_ID} environment variable is required"
            ))
        })?;
        let relay_channel_id = raw_channel
            .trim()
            .parse::<u64>()
            .map(ChannelId)
            .map_err(|_| {
                Error::Config(format!(
                    "{ENV_RELAY_CHANNEL_ID} must be a non-negative integer, got {raw_channel:?}"
                ))
            })?;

        let owner_name = get(ENV_OWNER_NAME)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_OWNER_NAME.to_string());

        Ok(Self {
            discord_bot_token: discord_bot_token.trim().to_string(),
            relay_channel_id,
            owner_name,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
