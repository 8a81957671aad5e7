//! Waits on the node's websocket event stream for one specific transaction
//! to be committed.
//!
//! Each wait owns its own connection. After subscribing, three concerns race
//! inside a single select loop: a best-effort keepalive ping, the inbound
//! read loop and a fixed timeout. Whichever resolves first delivers the one
//! and only outcome through a capacity-1 slot; the connection is torn down
//! on every exit path.

use mintx_core::types::{acc_input_event, Address, Bytes, TxEvent, TxHash};

use crate::transports::Request;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::Message, Error as WsError},
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transactions should take no more than this to be committed.
pub const COMMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Half the node's 30s websocket read timeout: the node drops connections
/// it considers idle.
const PING_INTERVAL: Duration = Duration::from_secs(15);

/// A commit event successfully correlated to the submitted transaction.
///
/// An execution exception is a protocol-level success carrying a semantic
/// failure; it is data here, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub return_value: Bytes,
    pub exception: Option<String>,
}

/// Error thrown while waiting for a commit event
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("error establishing websocket connection to wait for commit: {0}")]
    Connect(#[source] WsError),

    #[error("error subscribing to input event: {0}")]
    Subscribe(#[source] WsError),

    #[error("websocket transport error while waiting for commit: {0}")]
    Transport(#[source] WsError),

    #[error("websocket closed before a matching commit event arrived")]
    ConnectionClosed,

    #[error("error decoding event envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("event stream error: {0}")]
    Server(String),

    #[error("node url has unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid node endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("timed out waiting for commit event")]
    Timeout,

    #[error("commit waiter task went away without resolving")]
    Dropped,
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    result: Option<EventResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct EventResult {
    event: String,
    data: TxEvent,
}

/// An active subscription for a single transaction's commit event.
///
/// The subscription is live once `subscribe` returns, so it is safe to
/// broadcast afterwards without racing the event. Consume the resolution
/// with [`CommitWatch::wait`].
#[derive(Debug)]
pub struct CommitWatch {
    slot: mpsc::Receiver<Result<Commit, WaitError>>,
}

impl CommitWatch {
    /// Connects to the node's event endpoint, subscribes to the input event
    /// of `input_address` and starts listening for a commit event whose
    /// identity matches `expected`.
    pub async fn subscribe(
        node_url: &Url,
        chain_id: &str,
        input_address: Address,
        expected: TxHash,
    ) -> Result<Self, WaitError> {
        Self::subscribe_with_timeout(node_url, chain_id, input_address, expected, COMMIT_TIMEOUT)
            .await
    }

    /// Same as [`CommitWatch::subscribe`] with a caller-chosen timeout
    /// window.
    pub async fn subscribe_with_timeout(
        node_url: &Url,
        chain_id: &str,
        input_address: Address,
        expected: TxHash,
        window: Duration,
    ) -> Result<Self, WaitError> {
        let ws_url = websocket_url(node_url)?;
        debug!(url = %ws_url, "connecting to event endpoint");
        let (mut ws, _) = connect_async(ws_url.as_str()).await.map_err(WaitError::Connect)?;

        let event_id = acc_input_event(&input_address);
        let frame = serde_json::to_string(&Request::new("", "subscribe", [event_id.as_str()]))
            .expect("subscribe frame serialization is infallible");
        ws.send(Message::Text(frame)).await.map_err(WaitError::Subscribe)?;

        let (tx, rx) = mpsc::channel(1);
        let chain_id = chain_id.to_owned();
        tokio::spawn(async move {
            let res = listen(&mut ws, &event_id, &chain_id, &expected, window).await;
            // tear the connection down on every resolution path
            let _ = ws.close(None).await;
            // capacity-1 slot; if the caller is gone the resolution is
            // simply discarded
            let _ = tx.try_send(res);
        });

        Ok(Self { slot: rx })
    }

    /// Blocks until the wait resolves, exactly once.
    pub async fn wait(mut self) -> Result<Commit, WaitError> {
        match self.slot.recv().await {
            Some(res) => res,
            None => Err(WaitError::Dropped),
        }
    }
}

/// Rewrites the node's RPC address to its websocket event endpoint.
fn websocket_url(node_url: &Url) -> Result<Url, WaitError> {
    let mut url = node_url.join("websocket")?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" => return Ok(url),
        other => return Err(WaitError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| WaitError::UnsupportedScheme(node_url.scheme().to_string()))?;
    Ok(url)
}

async fn listen(
    ws: &mut WsStream,
    event_id: &str,
    chain_id: &str,
    expected: &TxHash,
    window: Duration,
) -> Result<Commit, WaitError> {
    let timeout = tokio::time::sleep(window);
    tokio::pin!(timeout);
    let first_ping = tokio::time::Instant::now() + PING_INTERVAL;
    let mut ping = tokio::time::interval_at(first_ping, PING_INTERVAL);

    loop {
        tokio::select! {
            _ = &mut timeout => return Err(WaitError::Timeout),
            _ = ping.tick() => {
                // best-effort keepalive; a failed ping is logged, not fatal
                if let Err(e) = ws.send(Message::Ping(Vec::new())).await {
                    debug!(err = %e, "error writing ping");
                }
            }
            frame = ws.next() => match frame {
                None => return Err(WaitError::ConnectionClosed),
                Some(Err(e)) => return Err(WaitError::Transport(e)),
                Some(Ok(Message::Text(text))) => {
                    if let Some(commit) = handle_frame(text.as_bytes(), event_id, chain_id, expected)? {
                        return Ok(commit);
                    }
                }
                Some(Ok(Message::Binary(buf))) => {
                    if let Some(commit) = handle_frame(&buf, event_id, chain_id, expected)? {
                        return Ok(commit);
                    }
                }
                Some(Ok(Message::Close(_))) => return Err(WaitError::ConnectionClosed),
                // control frames keep the connection alive, nothing to do
                Some(Ok(_)) => {}
            }
        }
    }
}

/// Decodes one inbound frame. `Ok(None)` means the frame did not concern our
/// transaction and listening continues.
fn handle_frame(
    raw: &[u8],
    event_id: &str,
    chain_id: &str,
    expected: &TxHash,
) -> Result<Option<Commit>, WaitError> {
    let envelope: EventEnvelope = serde_json::from_slice(raw)?;
    if let Some(error) = envelope.error {
        if !error.is_empty() {
            return Err(WaitError::Server(error));
        }
    }
    let result = match envelope.result {
        Some(result) => result,
        None => return Ok(None),
    };
    if result.event != event_id {
        debug!(got = %result.event, expected = %event_id, "received unsolicited event");
        return Ok(None);
    }
    let id = result.data.tx.tx_id(chain_id);
    if id != *expected {
        debug!(got = %id, "received event for same input from another transaction");
        return Ok(None);
    }
    let exception = if result.data.exception.is_empty() {
        None
    } else {
        Some(result.data.exception)
    };
    Ok(Some(Commit { return_value: result.data.return_value, exception }))
}
