//! Broadcast hub for dispatching events to connected gateway tasks.
//!
//! Uses a single `tokio::sync::broadcast` channel. Each connection
//! subscribes and filters events locally against its own subscription set,
//! which is efficient while one process owns the whole connection map.

use std::sync::Arc;

use tokio::sync::broadcast;

use gamerhub_common::wire::ServerEvent;

/// Capacity of the broadcast channel. Slow receivers that fall behind will
/// skip messages (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

/// A payload broadcast to all connected gateway tasks.
#[derive(Debug, Clone)]
pub struct BroadcastPayload {
    /// Canonical slug of the community this event belongs to.
    pub community: String,
    /// The event to deliver to subscribed connections.
    pub event: ServerEvent,
}

/// The global broadcast hub, shared through `AppState`.
#[derive(Clone)]
pub struct GatewayBroadcast {
    sender: broadcast::Sender<Arc<BroadcastPayload>>,
}

impl GatewayBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the broadcast channel. Each gateway connection should
    /// call this once to get its own receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BroadcastPayload>> {
        self.sender.subscribe()
    }

    /// Dispatch an event to all connected gateway tasks.
    pub fn dispatch(&self, payload: BroadcastPayload) {
        // send() errors when no receivers exist, which is fine.
        let _ = self.sender.send(Arc::new(payload));
    }
}
