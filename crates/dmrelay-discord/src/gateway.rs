//! Discord Gateway WebSocket session: identify, heartbeat, and decode the two
//! dispatches the relay cares about (`READY`, `MESSAGE_CREATE`).

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use futures::{Sink, SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
    sync::mpsc,
    time::{interval_at, sleep, Instant},
};
use tokio_tungstenite::tungstenite::{protocol::CloseFrame, Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dmrelay_core::{domain::User, messaging::types::IncomingMessage};

use crate::{
    wire::{GatewayPayload, Hello, RawMessage, Ready},
    install_crypto_provider, DiscordMessenger,
};

/// GUILDS (1) | GUILD_MESSAGES (512) | DIRECT_MESSAGES (4096) | MESSAGE_CONTENT (32768)
pub const GATEWAY_INTENTS: u64 = 1 | 512 | 4096 | 32768;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// Close codes after which reconnecting cannot help.
const FATAL_CLOSE_CODES: [u16; 4] = [
    4004, // authentication failed
    4010, // invalid shard
    4013, // invalid intents
    4014, // disallowed intents
];

#[derive(Clone, Debug)]
pub enum GatewayEvent {
    Ready(User),
    Message(IncomingMessage),
}

/// Outstanding-heartbeat bookkeeping. A beat that is still unacknowledged when
/// the next one is due means the connection is zombied.
#[derive(Debug, Default)]
struct Heartbeat {
    awaiting_ack: bool,
}

impl Heartbeat {
    /// Mark a beat as sent. Returns `false` if the previous one was never acked.
    fn beat(&mut self) -> bool {
        if self.awaiting_ack {
            return false;
        }
        self.awaiting_ack = true;
        true
    }

    fn ack(&mut self) {
        self.awaiting_ack = false;
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Cancelled,
    Reconnect,
    Closed,
    Fatal(String),
}

/// Keep a gateway session alive until `cancel` fires, reconnecting after drops.
///
/// Each new session produces a fresh `Ready` event.
pub async fn run(
    messenger: Arc<DiscordMessenger>,
    tx: mpsc::Sender<GatewayEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    install_crypto_provider();

    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let end = match messenger.gateway_url().await {
            Ok(url) => run_session(&url, messenger.token(), &tx, &cancel).await,
            Err(e) => Err(anyhow!(e).context("failed to get Discord gateway URL")),
        };

        match end {
            Ok(SessionEnd::Cancelled) => return Ok(()),
            Ok(SessionEnd::Fatal(reason)) => {
                return Err(anyhow!("Discord gateway refused the session: {reason}"))
            }
            Ok(end) => info!("Discord gateway session ended ({end:?}); reconnecting"),
            Err(e) => warn!("Discord gateway session failed: {e:#}"),
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = sleep(RECONNECT_DELAY) => {}
        }
    }
}

async fn run_session(
    url: &str,
    token: &str,
    tx: &mpsc::Sender<GatewayEvent>,
    cancel: &CancellationToken,
) -> anyhow::Result<SessionEnd> {
    info!("Connecting to Discord Gateway: {url}");
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .context("failed to connect to Discord Gateway")?;
    let (mut write, mut read) = ws.split();

    // Hello (op 10) carries the heartbeat interval.
    let heartbeat_ms = loop {
        let frame = read
            .next()
            .await
            .context("gateway closed before Hello")?
            .context("gateway read failed")?;
        let WsMessage::Text(text) = frame else {
            continue;
        };
        let payload: GatewayPayload = serde_json::from_str(text.as_str())?;
        if payload.op != OP_HELLO {
            warn!("Expected Hello (op 10), got op {}", payload.op);
            continue;
        }
        let hello: Hello = serde_json::from_value(payload.d)?;
        break hello.heartbeat_interval;
    };
    debug!("Discord heartbeat interval: {heartbeat_ms}ms");

    send_json(&mut write, identify_payload(token)).await?;

    let period = Duration::from_millis(heartbeat_ms.max(1));
    let mut heartbeat = interval_at(Instant::now() + period, period);
    let mut seq: Option<u64> = None;
    let mut beats = Heartbeat::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(WsMessage::Close(None)).await;
                return Ok(SessionEnd::Cancelled);
            }
            _ = heartbeat.tick() => {
                if !beats.beat() {
                    warn!("Discord heartbeat was not acknowledged; reconnecting");
                    let _ = write.send(WsMessage::Close(None)).await;
                    return Ok(SessionEnd::Reconnect);
                }
                send_json(&mut write, heartbeat_payload(seq)).await?;
            }
            frame = read.next() => {
                let Some(frame) = frame else {
                    return Ok(SessionEnd::Closed);
                };
                let text = match frame.context("gateway read failed")? {
                    WsMessage::Text(text) => text,
                    WsMessage::Close(frame) => return Ok(close_reason(frame)),
                    _ => continue,
                };

                let payload: GatewayPayload = match serde_json::from_str(text.as_str()) {
                    Ok(p) => p,
                    Err(e) => {
                        debug!("Skipping undecodable gateway frame: {e}");
                        continue;
                    }
                };
                if payload.s.is_some() {
                    seq = payload.s;
                }

                match payload.op {
                    OP_DISPATCH => {
                        let Some(event) = decode_dispatch(payload.t.as_deref(), payload.d) else {
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            debug!("Gateway event receiver dropped");
                            return Ok(SessionEnd::Cancelled);
                        }
                    }
                    OP_HEARTBEAT => send_json(&mut write, heartbeat_payload(seq)).await?,
                    OP_RECONNECT | OP_INVALID_SESSION => return Ok(SessionEnd::Reconnect),
                    OP_HEARTBEAT_ACK => beats.ack(),
                    other => debug!("Ignoring gateway op {other}"),
                }
            }
        }
    }
}

fn close_reason(frame: Option<CloseFrame>) -> SessionEnd {
    let Some(frame) = frame else {
        return SessionEnd::Closed;
    };
    let code = u16::from(frame.code);
    if FATAL_CLOSE_CODES.contains(&code) {
        SessionEnd::Fatal(format!("close code {code}: {}", frame.reason.as_str()))
    } else {
        info!("Discord gateway closed with code {code}: {}", frame.reason.as_str());
        SessionEnd::Closed
    }
}

/// Turn a dispatch into a relay event. Unrelated or malformed dispatches yield `None`.
fn decode_dispatch(kind: Option<&str>, data: Value) -> Option<GatewayEvent> {
    match kind? {
        "READY" => match serde_json::from_value::<Ready>(data).map(|r| r.user.into_user()) {
            Ok(Ok(me)) => Some(GatewayEvent::Ready(me)),
            Ok(Err(e)) => {
                warn!("Malformed READY user: {e}");
                None
            }
            Err(e) => {
                warn!("Malformed READY payload: {e}");
                None
            }
        },
        "MESSAGE_CREATE" => {
            match serde_json::from_value::<RawMessage>(data).map(RawMessage::into_incoming) {
                Ok(Ok(msg)) => Some(GatewayEvent::Message(msg)),
                Ok(Err(e)) => {
                    warn!("Malformed MESSAGE_CREATE ids: {e}");
                    None
                }
                Err(e) => {
                    warn!("Malformed MESSAGE_CREATE payload: {e}");
                    None
                }
            }
        }
        _ => None,
    }
}

fn identify_payload(token: &str) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": GATEWAY_INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "dmrelay",
                "device": "dmrelay"
            }
        }
    })
}

fn heartbeat_payload(seq: Option<u64>) -> Value {
    json!({ "op": OP_HEARTBEAT, "d": seq })
}

async fn send_json<S>(write: &mut S, value: Value) -> anyhow::Result<()>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    write
        .send(WsMessage::Text(value.to_string().into()))
        .await
        .context("gateway write failed")
}
