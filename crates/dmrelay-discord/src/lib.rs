//! Discord adapter.
//!
//! This crate implements the `dmrelay-core` MessagingPort over the Discord REST
//! API and feeds Gateway events into the relay.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::{sync::Mutex, time::sleep};
use tracing::warn;

pub mod gateway;
pub mod handlers;
pub mod router;
mod wire;

use dmrelay_core::{
    domain::{ChannelId, MessageRef, User, UserId},
    errors::Error,
    messaging::{port::MessagingPort, types::Embed},
    Result,
};

use crate::wire::{embed_json, ApiError, GatewayBot, RateLimited, RawSnowflakeObject, RawUser};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Longest 429 back-off we wait out before giving up on a request.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Select `ring` as the process-wide rustls provider for the gateway socket.
///
/// Calling it again after a provider is installed is a no-op.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[derive(Clone)]
pub struct DiscordMessenger {
    client: reqwest::Client,
    token: String,
    api_base: String,
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl DiscordMessenger {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base: DISCORD_API_BASE.to_string(),
            users: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Record an author seen on the gateway so later lookups skip the network.
    pub async fn remember(&self, user: &User) {
        self.users.lock().await.insert(user.id, user.clone());
    }

    /// WebSocket URL for a new gateway session.
    pub async fn gateway_url(&self) -> Result<String> {
        let body: GatewayBot = self.request(Method::GET, "/gateway/bot", None).await?;
        Ok(format!("{}/?v=10&encoding=json", body.url.trim_end_matches('/')))
    }

    /// One Discord REST call. A 429 is waited out once (per `retry_after`)
    /// and retried; any other failure is mapped straight away.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.api_base, path);
        let mut retried = false;

        loop {
            let mut req = self
                .client
                .request(method.clone(), &url)
                .header("Authorization", format!("Bot {}", self.token));
            if let Some(body) = &body {
                req = req.json(body);
            }

            let resp = req.send().await.map_err(map_transport_err)?;
            let status = resp.status();
            if status.is_success() {
                return resp.json::<T>().await.map_err(map_transport_err);
            }

            let header_wait = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok());
            let text = resp.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS && !retried {
                if let Some(wait) = retry_delay(&text, header_wait) {
                    warn!("Discord rate limited {method} {path}; retrying in {wait:?}");
                    sleep(wait).await;
                    retried = true;
                    continue;
                }
            }
            return Err(map_status(status, &text));
        }
    }

    async fn post_message(&self, channel_id: ChannelId, body: Value) -> Result<MessageRef> {
        let msg: RawSnowflakeObject = self
            .request(
                Method::POST,
                &format!("/channels/{channel_id}/messages"),
                Some(body),
            )
            .await?;
        Ok(MessageRef {
            channel_id,
            message_id: msg.message_id()?,
        })
    }
}

/// How long a 429 asks us to wait. The JSON body wins over the header; waits
/// beyond [`MAX_RETRY_AFTER`] (or unparseable ones) are not retried.
fn retry_delay(body: &str, header_secs: Option<f64>) -> Option<Duration> {
    let secs = serde_json::from_str::<RateLimited>(body)
        .ok()
        .map(|r| r.retry_after)
        .or(header_secs)?;
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|wait| *wait <= MAX_RETRY_AFTER)
}

fn map_transport_err(e: reqwest::Error) -> Error {
    Error::External(format!("discord request failed: {e}"))
}

/// Fold a non-2xx response into the core error taxonomy.
///
/// 404 means the target does not exist; 403 means it exists but refuses us
/// (for DMs: code 50007, the user blocks DMs from the bot).
fn map_status(status: StatusCode, body: &str) -> Error {
    let detail = match serde_json::from_str::<ApiError>(body) {
        Ok(api) => format!("{status} (error code: {}): {}", api.code, api.message),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", body.trim()),
    };

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(detail),
        StatusCode::FORBIDDEN => Error::Forbidden(detail),
        _ => Error::External(detail),
    }
}

#[async_trait]
impl MessagingPort for DiscordMessenger {
    async fn channel(&self, channel_id: ChannelId) -> Result<Option<ChannelId>> {
        let res: Result<RawSnowflakeObject> = self
            .request(Method::GET, &format!("/channels/{channel_id}"), None)
            .await;
        match res {
            Ok(ch) => ch.channel_id().map(Some),
            Err(e) if e.is_not_found() || e.is_forbidden() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        self.post_message(channel_id, json!({ "content": text }))
            .await
    }

    async fn send_embed(&self, channel_id: ChannelId, embed: &Embed) -> Result<MessageRef> {
        self.post_message(channel_id, json!({ "embeds": [embed_json(embed)] }))
            .await
    }

    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<MessageRef> {
        let dm: RawSnowflakeObject = self
            .request(
                Method::POST,
                "/users/@me/channels",
                Some(json!({ "recipient_id": user_id.to_string() })),
            )
            .await?;
        self.send_text(dm.channel_id()?, text).await
    }

    async fn cached_user(&self, user_id: UserId) -> Option<User> {
        self.users.lock().await.get(&user_id).cloned()
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<User> {
        let raw: RawUser = self
            .request(Method::GET, &format!("/users/{user_id}"), None)
            .await?;
        raw.into_user()
    }
}
