//! Gateway connection manager.
//!
//! Owns the single long-lived WebSocket for a client process. Consumers
//! emit events through a command channel and register per-event listeners;
//! each registration returns a [`ListenerHandle`] that unregisters itself
//! when dropped, so a view can register on mount and is guaranteed to
//! release on unmount, whatever the exit path.
//!
//! The manager reconnects on its own with exponential backoff
//! (2→4→8→16→30 s cap) and replays the membership sync event before
//! anything else on every (re)connect, re-arming the subscriptions the
//! previous socket held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use gamerhub_common::wire::{ClientEvent, ServerEvent};

use crate::error::SdkError;
use crate::session::SessionState;
use crate::sync::MembershipSynchronizer;

const MAX_BACKOFF: Duration = Duration::from_secs(30);
const COMMAND_BUFFER: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the gateway connection.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8000/gateway`.
    pub gateway_url: String,
    /// HTTP API origin, e.g. `http://localhost:8000`.
    pub api_url: String,
    /// First reconnect delay; doubles per attempt up to a 30 s cap.
    pub initial_backoff: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            gateway_url: "ws://localhost:8000/gateway".to_string(),
            api_url: "http://localhost:8000".to_string(),
            initial_backoff: Duration::from_secs(2),
        }
    }
}

/// Anything that can emit client events toward the backend.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: ClientEvent) -> Result<(), SdkError>;
}

#[derive(Debug)]
enum Command {
    Emit(ClientEvent),
    Shutdown,
}

type Handler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Listener table keyed by wire event name.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    handlers: parking_lot::Mutex<HashMap<String, Vec<(u64, Handler)>>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn add(&self, event: &str, handler: Handler) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    pub(crate) fn remove(&self, event: &str, id: u64) {
        let mut handlers = self.handlers.lock();
        if let Some(list) = handlers.get_mut(event) {
            list.retain(|(entry_id, _)| *entry_id != id);
            if list.is_empty() {
                handlers.remove(event);
            }
        }
    }

    pub(crate) fn dispatch(&self, event: &ServerEvent) {
        // Clone the handlers out so user callbacks run without the lock.
        let handlers: Vec<Handler> = self
            .handlers
            .lock()
            .get(event.name())
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in handlers {
            handler(event);
        }
    }
}

/// Releases its listener registration when dropped.
pub struct ListenerHandle {
    event: String,
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    /// Explicit release for call sites where a bare `drop` reads poorly.
    pub fn release(self) {}
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event, self.id);
        }
    }
}

/// Handle to the running gateway connection.
pub struct Connection {
    cmd_tx: mpsc::Sender<Command>,
    listeners: Arc<ListenerRegistry>,
    session: Arc<SessionState>,
    config: ConnectConfig,
}

impl Connection {
    /// Spawn the connection task. The socket is established, and
    /// re-established, in the background; emitted events queue while the
    /// transport is down.
    pub fn connect(config: ConnectConfig, session: Arc<SessionState>) -> Self {
        let listeners = Arc::new(ListenerRegistry::new());
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

        tokio::spawn(run_loop(
            config.clone(),
            Arc::clone(&session),
            Arc::clone(&listeners),
            cmd_rx,
        ));

        Self {
            cmd_tx,
            listeners,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    /// Register a listener for a wire event name. Multiple listeners may
    /// coexist per event; dropping the returned handle removes only this
    /// one.
    pub fn on<F>(&self, event: &str, handler: F) -> ListenerHandle
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let id = self.listeners.add(event, Arc::new(handler));
        ListenerHandle {
            event: event.to_string(),
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Close the socket and stop reconnecting.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
    }
}

#[async_trait]
impl EventSink for Connection {
    async fn emit(&self, event: ClientEvent) -> Result<(), SdkError> {
        self.cmd_tx
            .send(Command::Emit(event))
            .await
            .map_err(|_| SdkError::ConnectionClosed)
    }
}

enum Driven {
    Shutdown,
    Disconnected,
}

async fn run_loop(
    config: ConnectConfig,
    session: Arc<SessionState>,
    listeners: Arc<ListenerRegistry>,
    mut cmd_rx: mpsc::Receiver<Command>,
) {
    let synchronizer = MembershipSynchronizer::new(session);
    let mut backoff = config.initial_backoff;

    loop {
        match tokio_tungstenite::connect_async(&config.gateway_url).await {
            Ok((socket, _)) => {
                tracing::info!(url = %config.gateway_url, "gateway connected");
                backoff = config.initial_backoff;

                match drive_socket(socket, &synchronizer, &listeners, &mut cmd_rx).await {
                    Driven::Shutdown => return,
                    Driven::Disconnected => {
                        tracing::warn!("gateway connection lost; reconnecting");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, url = %config.gateway_url, "gateway connect failed");
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

async fn drive_socket(
    socket: WsStream,
    synchronizer: &MembershipSynchronizer,
    listeners: &ListenerRegistry,
    cmd_rx: &mut mpsc::Receiver<Command>,
) -> Driven {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Replay memberships before anything else so the backend re-arms every
    // subscription the previous socket held.
    if let Some(event) = synchronizer.replay_event() {
        if send_event(&mut ws_tx, &event).await.is_err() {
            return Driven::Disconnected;
        }
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Command::Emit(event)) => {
                        if send_event(&mut ws_tx, &event).await.is_err() {
                            return Driven::Disconnected;
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        let _ = ws_tx.send(tungstenite::Message::Close(None)).await;
                        return Driven::Shutdown;
                    }
                }
            }

            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => listeners.dispatch(&event),
                            Err(error) => {
                                tracing::debug!(%error, "ignoring malformed server frame");
                            }
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_)))
                    | Some(Ok(tungstenite::Message::Pong(_))) => continue,
                    Some(Ok(tungstenite::Message::Close(_))) | None => {
                        return Driven::Disconnected;
                    }
                    Some(Err(error)) => {
                        tracing::debug!(%error, "gateway read error");
                        return Driven::Disconnected;
                    }
                    Some(Ok(_)) => continue,
                }
            }
        }
    }
}

async fn send_event(
    ws_tx: &mut SplitSink<WsStream, tungstenite::Message>,
    event: &ClientEvent,
) -> Result<(), tungstenite::Error> {
    let json = serde_json::to_string(event).unwrap();
    ws_tx.send(tungstenite::Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gamerhub_common::wire::{WireMessage, WireSender};
    use parking_lot::Mutex;

    fn sample_event(id: i64) -> ServerEvent {
        ServerEvent::ReceiveMessage(WireMessage {
            id,
            genre: "rpg".into(),
            content: "hi".into(),
            sender: WireSender {
                id: "usr_1".into(),
                user_name: "dana".into(),
            },
            created_at: Utc::now(),
        })
    }

    fn recording_handler(seen: Arc<Mutex<Vec<i64>>>) -> Handler {
        Arc::new(move |event: &ServerEvent| {
            let ServerEvent::ReceiveMessage(message) = event;
            seen.lock().push(message.id);
        })
    }

    #[test]
    fn dispatch_reaches_every_listener() {
        let registry = ListenerRegistry::new();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        registry.add("receive-message", recording_handler(Arc::clone(&seen_a)));
        registry.add("receive-message", recording_handler(Arc::clone(&seen_b)));

        registry.dispatch(&sample_event(1));

        assert_eq!(*seen_a.lock(), vec![1]);
        assert_eq!(*seen_b.lock(), vec![1]);
    }

    #[test]
    fn removing_one_listener_leaves_the_other() {
        let registry = ListenerRegistry::new();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let id_a = registry.add("receive-message", recording_handler(Arc::clone(&seen_a)));
        registry.add("receive-message", recording_handler(Arc::clone(&seen_b)));

        registry.remove("receive-message", id_a);
        registry.dispatch(&sample_event(2));

        assert!(seen_a.lock().is_empty());
        assert_eq!(*seen_b.lock(), vec![2]);
    }

    #[test]
    fn handle_drop_unregisters() {
        let registry = Arc::new(ListenerRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let id = registry.add("receive-message", recording_handler(Arc::clone(&seen)));
        let handle = ListenerHandle {
            event: "receive-message".to_string(),
            id,
            registry: Arc::downgrade(&registry),
        };

        registry.dispatch(&sample_event(1));
        drop(handle);
        registry.dispatch(&sample_event(2));

        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn dispatch_ignores_events_with_no_listeners() {
        let registry = ListenerRegistry::new();
        // No listeners registered at all; must not panic.
        registry.dispatch(&sample_event(1));
    }
}
