// Push notification listener
//
// The simulator broadcasts `status_update` events over Socket.IO. This
// module speaks just enough Engine.IO v4 over a plain websocket to join the
// default namespace, answer heartbeats and forward status events to the app.
// The blocking websocket runs on its own thread; the app only ever sees
// owned `PushEvent`s arriving on a channel. A session that hears nothing
// for pingInterval + pingTimeout is treated as lost.

use crate::model::StatusUpdate;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::io;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Delay between reconnect attempts
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Socket.IO event carrying the status payload
pub const STATUS_EVENT: &str = "status_update";

/// Engine.IO v4 server defaults, used until the handshake says otherwise
const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;
const DEFAULT_PING_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("no heartbeat for {0:?}")]
    HeartbeatTimeout(Duration),

    #[error("socket setup failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed {event} payload: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What the listener reports to the app
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected(String),
    Status(StatusUpdate),
}

/// Engine.IO packet, decoded from one websocket text frame
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake with session parameters (JSON)
    Open(String),
    Close,
    Ping(String),
    Pong(String),
    /// Socket.IO packet carried inside an Engine.IO message
    Message(SocketPacket),
    Noop,
}

/// Socket.IO packet types the client cares about
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, args: Vec<Value> },
    ConnectError(String),
    Other(String),
}

/// Session parameters from the Engine.IO open packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Handshake {
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL_MS,
            ping_timeout: DEFAULT_PING_TIMEOUT_MS,
        }
    }
}

impl Handshake {
    /// Parse the open packet body, falling back to server defaults
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Longest silence allowed before the server is presumed gone
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn set_read_timeout(socket: &Socket, timeout: Duration) -> Result<(), PushError> {
    if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
        stream.set_read_timeout(Some(timeout))?;
    }
    Ok(())
}

/// Decode one Engine.IO text frame
pub fn decode_engine_packet(frame: &str) -> Option<EnginePacket> {
    let mut chars = frame.chars();
    let kind = chars.next()?;
    let body = chars.as_str();

    match kind {
        '0' => Some(EnginePacket::Open(body.to_string())),
        '1' => Some(EnginePacket::Close),
        '2' => Some(EnginePacket::Ping(body.to_string())),
        '3' => Some(EnginePacket::Pong(body.to_string())),
        '4' => Some(EnginePacket::Message(decode_socket_packet(body))),
        '6' => Some(EnginePacket::Noop),
        _ => None,
    }
}

/// Decode a Socket.IO packet on the default namespace
fn decode_socket_packet(body: &str) -> SocketPacket {
    let mut chars = body.chars();
    let Some(kind) = chars.next() else {
        return SocketPacket::Other(String::new());
    };
    let rest = chars.as_str();

    match kind {
        '0' => SocketPacket::Connect,
        '1' => SocketPacket::Disconnect,
        '2' => decode_event(rest).unwrap_or_else(|| SocketPacket::Other(body.to_string())),
        '4' => SocketPacket::ConnectError(rest.to_string()),
        _ => SocketPacket::Other(body.to_string()),
    }
}

/// Parse `[<ack id>]["name", args...]`
fn decode_event(rest: &str) -> Option<SocketPacket> {
    // Packets on the default namespace carry no "/nsp," prefix;
    // an optional numeric ack id precedes the JSON array
    let json = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let Value::Array(mut items) = serde_json::from_str::<Value>(json).ok()? else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    let Value::String(name) = items.remove(0) else {
        return None;
    };
    Some(SocketPacket::Event { name, args: items })
}

/// Websocket URL of the Socket.IO endpoint for a simulator base URL
pub fn socket_url(base: &Url) -> Result<Url, PushError> {
    let mut url = base
        .join("/socket.io/")
        .map_err(|e| PushError::Handshake(e.to_string()))?;
    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| PushError::Handshake(format!("cannot use scheme {} for {}", scheme, base)))?;
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// Turn a Socket.IO event into a push event, if it is one we handle
pub fn status_from_event(name: &str, args: &[Value]) -> Result<Option<StatusUpdate>, PushError> {
    if name != STATUS_EVENT {
        return Ok(None);
    }
    let payload = args.first().cloned().unwrap_or(Value::Null);
    serde_json::from_value(payload)
        .map(Some)
        .map_err(|source| PushError::Decode {
            event: name.to_string(),
            source,
        })
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Start the listener thread
///
/// Reconnects after `RECONNECT_DELAY` whenever the connection drops and
/// exits once the receiving side of `sender` is gone.
pub fn spawn_listener(base: Url, sender: UnboundedSender<PushEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let url = match socket_url(&base) {
            Ok(url) => url,
            Err(err) => {
                tracing::error!(error = %err, "Push listener disabled");
                return;
            }
        };

        loop {
            match run_session(&url, &sender) {
                Ok(()) => {}
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "Push connection lost");
                    if sender.send(PushEvent::Disconnected(err.to_string())).is_err() {
                        return;
                    }
                }
            }
            if sender.is_closed() {
                return;
            }
            thread::sleep(RECONNECT_DELAY);
        }
    })
}

/// One websocket session; returns when the server closes or an error occurs
fn run_session(url: &Url, sender: &UnboundedSender<PushEvent>) -> Result<(), PushError> {
    let (mut socket, _response) = tungstenite::connect(url.as_str())?;
    tracing::info!(url = %url, "Push transport connected");

    let mut timeout = Handshake::default().read_timeout();
    set_read_timeout(&socket, timeout)?;

    loop {
        let message = match socket.read() {
            Ok(message) => message,
            // Half-open connections never error on their own
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {
                return Err(PushError::HeartbeatTimeout(timeout));
            }
            Err(err) => return Err(err.into()),
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Ping(payload) => {
                socket.send(Message::Pong(payload))?;
                continue;
            }
            Message::Close(_) => return Ok(()),
            _ => continue,
        };

        let Some(packet) = decode_engine_packet(&text) else {
            tracing::trace!(frame = %text, "Ignoring unknown engine packet");
            continue;
        };

        if let EnginePacket::Open(body) = &packet {
            let handshake = Handshake::parse(body);
            timeout = handshake.read_timeout();
            set_read_timeout(&socket, timeout)?;
            tracing::debug!(?timeout, "Heartbeat timeout set");
        }

        if !handle_packet(&mut socket, packet, sender)? {
            return Ok(());
        }
    }
}

/// Returns `false` when the session should end
fn handle_packet(
    socket: &mut Socket,
    packet: EnginePacket,
    sender: &UnboundedSender<PushEvent>,
) -> Result<bool, PushError> {
    match packet {
        EnginePacket::Open(_) => {
            // Join the default namespace
            socket.send(Message::Text("40".to_string()))?;
        }
        EnginePacket::Ping(payload) => {
            socket.send(Message::Text(format!("3{}", payload)))?;
        }
        EnginePacket::Close => return Ok(false),
        EnginePacket::Pong(_) | EnginePacket::Noop => {}
        EnginePacket::Message(SocketPacket::Connect) => {
            if sender.send(PushEvent::Connected).is_err() {
                return Ok(false);
            }
        }
        EnginePacket::Message(SocketPacket::ConnectError(reason)) => {
            return Err(PushError::Handshake(reason));
        }
        EnginePacket::Message(SocketPacket::Disconnect) => return Ok(false),
        EnginePacket::Message(SocketPacket::Event { name, args }) => {
            match status_from_event(&name, &args) {
                Ok(Some(update)) => {
                    if sender.send(PushEvent::Status(update)).is_err() {
                        return Ok(false);
                    }
                }
                Ok(None) => tracing::trace!(event = %name, "Ignoring event"),
                Err(err) => tracing::warn!(error = %err, "Dropping malformed push event"),
            }
        }
        EnginePacket::Message(SocketPacket::Other(raw)) => {
            tracing::trace!(packet = %raw, "Ignoring socket packet");
        }
    }
    Ok(true)
}
