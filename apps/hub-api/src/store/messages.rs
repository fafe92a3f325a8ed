//! Per-community append-ordered message logs.

use dashmap::DashMap;
use parking_lot::Mutex;

use gamerhub_common::normalize_slug;
use gamerhub_common::wire::{ServerEvent, WireMessage};

use crate::gateway::fanout::{BroadcastPayload, GatewayBroadcast};

pub struct MessageStore {
    logs: DashMap<String, Mutex<Vec<WireMessage>>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            logs: DashMap::new(),
        }
    }

    /// Append a message and fan it out to subscribers.
    ///
    /// The per-community log mutex is the single append point: dispatching
    /// while it is held means every subscriber observes messages in exactly
    /// the order the log accepted them.
    pub fn append_and_dispatch(&self, broadcast: &GatewayBroadcast, message: WireMessage) {
        let slug = normalize_slug(&message.genre);
        let log = self
            .logs
            .entry(slug.clone())
            .or_insert_with(|| Mutex::new(Vec::new()));

        let mut entries = log.lock();
        entries.push(message.clone());
        broadcast.dispatch(BroadcastPayload {
            community: slug,
            event: ServerEvent::ReceiveMessage(message),
        });
    }

    /// Ordered backlog for a community, oldest first. Unknown communities
    /// have an empty history.
    pub fn history(&self, slug: &str) -> Vec<WireMessage> {
        match self.logs.get(&normalize_slug(slug)) {
            Some(log) => log.lock().clone(),
            None => Vec::new(),
        }
    }
}
