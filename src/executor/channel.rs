//! Channel executor: a long-lived duplex channel per browser tab.
//!
//! Commands are pushed with a locally generated correlation id and the
//! response is matched back to the waiting caller by that id. The relay on
//! the other end processes requests strictly in order, so the executor
//! enforces at-most-one-outstanding-command per channel itself; the pending
//! command occupies a single rendezvous slot, never an unbounded queue.
//!
//! # Relay wire format
//!
//! Request: `{"id": <uuid>, "request": <command-name>, ...params}`.
//! Response: `{"id": <uuid>, "response": <command-name>, "status": <bool>,
//! ...fields}` — or, for the in-page evaluate bridge, a `statusCode` field
//! where `0` is success and `17` an unhandled script error.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{Map, Value, from_str, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::{TransportRequest, TransportResponse};

use super::Executor;

// ============================================================================
// ChannelId
// ============================================================================

/// Identifier of a channel, i.e. the tab/connection it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u32);

impl ChannelId {
    /// Wraps a tab/connection id.
    #[inline]
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel/{}", self.0)
    }
}

// ============================================================================
// Relay Messages
// ============================================================================

/// Relay response status: a success flag or a numeric code.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RelayStatus {
    Flag(bool),
    Code(i64),
}

/// A response frame from the relay.
#[derive(Debug, Deserialize)]
struct RelayResponse {
    /// Matches the request's correlation id.
    id: Uuid,
    /// Echo of the command name.
    #[serde(rename = "response")]
    _response: String,
    status: RelayStatus,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Builds the relay request frame for a transport request.
fn relay_frame(id: Uuid, request: &TransportRequest) -> String {
    let mut frame = Map::new();
    frame.insert("id".to_string(), json!(id));
    frame.insert(
        "request".to_string(),
        Value::String(request.command.wire_name().to_string()),
    );
    if let Some(Value::Object(params)) = &request.body {
        for (key, value) in params {
            frame.insert(key.clone(), value.clone());
        }
    }
    Value::Object(frame).to_string()
}

/// Converts a relay response into the standard wire envelope so the codec
/// and classifier see one shape regardless of transport.
fn relay_to_transport(response: RelayResponse) -> TransportResponse {
    let RelayResponse { status, fields, .. } = response;

    let status_code = fields.get("statusCode").and_then(Value::as_i64);
    let code = match status {
        RelayStatus::Flag(true) => status_code.unwrap_or(0),
        RelayStatus::Flag(false) => status_code.unwrap_or(13),
        RelayStatus::Code(n) => n,
    };

    let value = match fields.get("value") {
        Some(v) => v.clone(),
        None if code == 0 => Value::Null,
        // Error with no explicit value: promote the remaining fields so at
        // least a message survives classification.
        None => Value::Object(
            fields
                .iter()
                .filter(|(k, _)| *k != "statusCode")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
    };

    let envelope = json!({
        "status": code,
        "sessionId": fields.get("sessionId"),
        "value": value,
    });
    TransportResponse::new(200, envelope.to_string())
}

// ============================================================================
// ChannelCommand
// ============================================================================

/// Internal commands for the receive loop.
enum ChannelCommand {
    /// Transmit a frame and park the reply sender in the pending slot.
    Send {
        id: Uuid,
        frame: String,
        reply: oneshot::Sender<Result<RelayResponse>>,
    },
    /// Close the channel.
    Shutdown,
}

// ============================================================================
// Channel
// ============================================================================

/// One duplex channel to a relay endpoint (one browser tab).
///
/// The receive loop runs as its own task. A per-channel async lock makes
/// `execute` calls strictly sequential; the single pending reply lives in a
/// one-element slot inside the loop.
pub struct Channel {
    command_tx: mpsc::UnboundedSender<ChannelCommand>,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

impl Clone for Channel {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl Channel {
    /// Creates a channel over an established WebSocket stream and spawns
    /// its receive loop.
    #[must_use]
    pub fn new<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run_receive_loop(ws_stream, command_rx));
        Self {
            command_tx,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Connects to a relay endpoint by WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns a transport failure if the handshake fails.
    pub async fn connect(url: &str) -> Result<Channel> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::transport(format!("connect {url}: {e}")))?;
        Ok(Channel::new(ws_stream))
    }

    /// Sends one command frame and waits for its correlated response.
    ///
    /// Callers are serialized per channel; the relay protocol assumes one
    /// in-flight command. The caller (session layer) applies the timeout.
    ///
    /// # Errors
    ///
    /// - Transport failure if the channel is closed or the socket errors.
    /// - Cancelled if the channel shuts down underneath the waiter.
    pub async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let _guard = self.in_flight.lock().await;

        let id = Uuid::new_v4();
        let frame = relay_frame(id, request);
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ChannelCommand::Send {
                id,
                frame,
                reply: reply_tx,
            })
            .map_err(|_| Error::transport("channel closed"))?;

        let response = reply_rx
            .await
            .map_err(|_| Error::cancelled(request.command.wire_name()))??;

        Ok(relay_to_transport(response))
    }

    /// Closes the channel. Pending waiters observe a cancelled outcome.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ChannelCommand::Shutdown);
    }

    /// Receive loop: socket I/O plus the single pending-reply slot.
    async fn run_receive_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut pending: Option<(Uuid, oneshot::Sender<Result<RelayResponse>>)> = None;

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_frame(&text, &mut pending);
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Channel closed by remote");
                            fail_pending(&mut pending, || Error::transport("channel closed by remote"));
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Channel socket error");
                            fail_pending(&mut pending, || Error::transport(e.to_string()));
                            break;
                        }
                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ChannelCommand::Send { id, frame, reply }) => {
                            // A timed-out or dropped caller leaves its reply
                            // sender parked with the receiver gone; reclaim
                            // the slot before parking the next command. A
                            // late response for the stale id is dropped by
                            // the correlation check in handle_frame.
                            if let Some((stale, _)) =
                                pending.take_if(|(_, parked)| parked.is_closed())
                            {
                                debug!(id = %stale, "Discarding abandoned in-flight command");
                            }
                            if pending.is_some() {
                                let _ = reply.send(Err(Error::transport(
                                    "relay channel already has a command in flight",
                                )));
                                continue;
                            }
                            match ws_write.send(Message::Text(frame.into())).await {
                                Ok(()) => {
                                    trace!(%id, "Relay frame sent");
                                    pending = Some((id, reply));
                                }
                                Err(e) => {
                                    let _ = reply.send(Err(Error::transport(e.to_string())));
                                }
                            }
                        }
                        Some(ChannelCommand::Shutdown) | None => {
                            fail_pending(&mut pending, || Error::cancelled("in-flight command"));
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!("Channel receive loop terminated");
    }

    /// Routes one incoming frame to the pending waiter.
    fn handle_frame(text: &str, pending: &mut Option<(Uuid, oneshot::Sender<Result<RelayResponse>>)>) {
        let response = match from_str::<RelayResponse>(text) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Unparseable relay frame");
                return;
            }
        };

        match pending.take() {
            Some((id, reply)) if id == response.id => {
                let _ = reply.send(Ok(response));
            }
            Some(other) => {
                warn!(id = %response.id, "Relay response for unknown correlation id");
                *pending = Some(other);
            }
            None => {
                warn!(id = %response.id, "Relay response with no command in flight");
            }
        }
    }
}

fn fail_pending(
    pending: &mut Option<(Uuid, oneshot::Sender<Result<RelayResponse>>)>,
    error: impl FnOnce() -> Error,
) {
    if let Some((_, reply)) = pending.take() {
        let _ = reply.send(Err(error()));
    }
}

// ============================================================================
// ChannelRegistry
// ============================================================================

/// Registry of live channels keyed by tab/connection id.
///
/// Replaces ambient globals with explicit lifecycle: `register` when a tab
/// connects, `lookup` to dispatch, `unregister` when the tab closes.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Mutex<FxHashMap<ChannelId, Channel>>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a channel. Replacing an existing channel shuts the old one
    /// down.
    pub fn register(&self, id: ChannelId, channel: Channel) {
        debug!(%id, "Registering channel");
        if let Some(previous) = self.channels.lock().insert(id, channel) {
            warn!(%id, "Replaced an existing channel");
            previous.shutdown();
        }
    }

    /// Looks up the channel for a tab.
    #[must_use]
    pub fn lookup(&self, id: ChannelId) -> Option<Channel> {
        self.channels.lock().get(&id).cloned()
    }

    /// Unregisters and shuts down a channel.
    pub fn unregister(&self, id: ChannelId) {
        debug!(%id, "Unregistering channel");
        if let Some(channel) = self.channels.lock().remove(&id) {
            channel.shutdown();
        }
    }

    /// Number of live channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Returns `true` if no channels are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }
}

// ============================================================================
// ChannelExecutor
// ============================================================================

/// [`Executor`] that dispatches commands over the active tab's channel.
pub struct ChannelExecutor {
    registry: Arc<ChannelRegistry>,
    active: Mutex<Option<ChannelId>>,
}

impl ChannelExecutor {
    /// Creates an executor over a channel registry.
    #[must_use]
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            active: Mutex::new(None),
        }
    }

    /// Selects the channel commands are dispatched to.
    pub fn set_active(&self, id: ChannelId) {
        *self.active.lock() = Some(id);
    }

    /// Returns the currently active channel id.
    #[must_use]
    pub fn active(&self) -> Option<ChannelId> {
        *self.active.lock()
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }
}

#[async_trait]
impl Executor for ChannelExecutor {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let id = self
            .active()
            .ok_or_else(|| Error::transport("no active channel selected"))?;
        let channel = self
            .registry
            .lookup(id)
            .ok_or_else(|| Error::transport(format!("no channel registered for {id}")))?;
        channel.execute(request).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, CommandId, SessionId, decode, encode};
    use serde_json::json;

    fn parse_relay(text: &str) -> RelayResponse {
        from_str(text).expect("relay frame")
    }

    #[test]
    fn test_relay_frame_shape() {
        let request = encode(
            Command::new(CommandId::FindElement)
                .with_session(SessionId::new("S1"))
                .with_param("using", "id")
                .with_param("value", "main"),
        )
        .expect("encode");

        let id = Uuid::new_v4();
        let frame: Value = from_str(&relay_frame(id, &request)).expect("json");
        assert_eq!(frame["request"], "findElement");
        assert_eq!(frame["using"], "id");
        assert_eq!(frame["value"], "main");
        assert_eq!(frame["id"], json!(id));
    }

    #[test]
    fn test_relay_success_to_wire_envelope() {
        let relay = parse_relay(
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000",
                "response": "getTitle", "status": true, "value": "Example"}"#,
        );
        let transport = relay_to_transport(relay);
        let response = decode(&transport).expect("decode");
        assert!(response.status.is_success());
        assert_eq!(response.value, "Example");
    }

    #[test]
    fn test_relay_failure_defaults_to_unknown_error_code() {
        let relay = parse_relay(
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000",
                "response": "clickElement", "status": false,
                "message": "element vanished"}"#,
        );
        let transport = relay_to_transport(relay);
        let response = decode(&transport).expect("decode");
        assert_eq!(response.status, crate::protocol::Status::Code(13));
        assert_eq!(response.value["message"], "element vanished");
    }

    #[test]
    fn test_relay_evaluate_bridge_status_code() {
        // In-page bridge reports statusCode 17 for unhandled script errors.
        let relay = parse_relay(
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000",
                "response": "executeScript", "status": false,
                "statusCode": 17, "value": {"message": "ReferenceError: x"}}"#,
        );
        let transport = relay_to_transport(relay);
        let response = decode(&transport).expect("decode");
        assert_eq!(response.status, crate::protocol::Status::Code(17));
    }

    #[tokio::test]
    async fn test_abandoned_command_frees_the_channel() {
        use tokio_tungstenite::tungstenite::protocol::Role;

        let (client, server) = tokio::io::duplex(4096);
        let channel =
            Channel::new(WebSocketStream::from_raw_socket(client, Role::Client, None).await);
        let mut peer = WebSocketStream::from_raw_socket(server, Role::Server, None).await;

        let request =
            encode(Command::new(CommandId::GetTitle).with_session(SessionId::new("S1")))
                .expect("encode");

        // The peer stays silent; the caller gives up and drops the future,
        // leaving its reply sender parked in the pending slot.
        let gave_up = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            channel.execute(&request),
        )
        .await;
        assert!(gave_up.is_err());

        let abandoned = peer.next().await.expect("frame").expect("frame");
        assert!(abandoned.to_text().expect("text").contains("getTitle"));

        // The next command must reclaim the slot and correlate normally.
        let responder = async {
            let msg = peer.next().await.expect("frame").expect("frame");
            let frame: Value = from_str(msg.to_text().expect("text")).expect("json");
            let reply = json!({
                "id": frame["id"],
                "response": "getTitle",
                "status": true,
                "value": "Example",
            });
            peer.send(Message::Text(reply.to_string().into()))
                .await
                .expect("send");
        };

        let (result, ()) = tokio::join!(channel.execute(&request), responder);
        let response = decode(&result.expect("channel not wedged")).expect("decode");
        assert!(response.status.is_success());
        assert_eq!(response.value, "Example");
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = ChannelRegistry::new();
        assert!(registry.is_empty());

        // A channel whose socket never existed still exercises registration.
        let (tx, _rx) = mpsc::unbounded_channel();
        let channel = Channel {
            command_tx: tx,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        };

        let id = ChannelId::new(7);
        registry.register(id, channel);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(id).is_some());
        assert!(registry.lookup(ChannelId::new(8)).is_none());

        registry.unregister(id);
        assert!(registry.is_empty());
        assert!(registry.lookup(id).is_none());
    }

    #[tokio::test]
    async fn test_executor_without_active_channel_is_transport_failure() {
        let executor = ChannelExecutor::new(Arc::new(ChannelRegistry::new()));
        let request = encode(Command::new(CommandId::Status)).expect("encode");
        let err = executor.send(&request).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_executor_with_unregistered_active_channel() {
        let executor = ChannelExecutor::new(Arc::new(ChannelRegistry::new()));
        executor.set_active(ChannelId::new(1));
        let request = encode(Command::new(CommandId::Status)).expect("encode");
        let err = executor.send(&request).await.unwrap_err();
        assert!(err.is_transport());
    }
}
