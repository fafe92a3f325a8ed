//! Live (connection × community) subscription registry.
//!
//! Subscriptions are ephemeral: created on join or sync, destroyed when the
//! connection unregisters, never persisted. Attachment is idempotent, so a
//! client replaying `sync-my-communities` after a reconnect cannot end up
//! double-subscribed.
//!
//! Callers pass canonical slugs; normalization happens at the event
//! boundary in the handler.

use std::collections::HashSet;

use dashmap::DashMap;
use parking_lot::Mutex;

struct ConnectionEntry {
    user_id: Option<String>,
    subscriptions: HashSet<String>,
}

/// Shared registry of all live gateway connections.
///
/// Uses `DashMap` for shard-level concurrency and `parking_lot::Mutex` per
/// entry for non-poisoning, fast locking.
pub struct ConnectionRegistry {
    connections: DashMap<String, Mutex<ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection with no subscriptions yet.
    pub fn register(&self, connection_id: &str) {
        self.connections.insert(
            connection_id.to_string(),
            Mutex::new(ConnectionEntry {
                user_id: None,
                subscriptions: HashSet::new(),
            }),
        );
    }

    /// Drop the connection and every subscription it held.
    pub fn unregister(&self, connection_id: &str) {
        self.connections.remove(connection_id);
    }

    /// Remember which user is driving this connection (from the last join).
    pub fn set_user(&self, connection_id: &str, user_id: &str) {
        if let Some(entry) = self.connections.get(connection_id) {
            entry.lock().user_id = Some(user_id.to_string());
        }
    }

    pub fn user_of(&self, connection_id: &str) -> Option<String> {
        let entry = self.connections.get(connection_id)?;
        let user = entry.lock().user_id.clone();
        user
    }

    /// Attach the connection to one community. Returns `true` only when the
    /// subscription did not already exist.
    pub fn subscribe(&self, connection_id: &str, slug: &str) -> bool {
        match self.connections.get(connection_id) {
            Some(entry) => entry.lock().subscriptions.insert(slug.to_string()),
            None => false,
        }
    }

    /// Attach the connection to every community in the set. Returns how many
    /// subscriptions were newly created.
    pub fn subscribe_many<I, S>(&self, connection_id: &str, slugs: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self.connections.get(connection_id) {
            Some(entry) => {
                let mut inner = entry.lock();
                slugs
                    .into_iter()
                    .filter(|slug| inner.subscriptions.insert(slug.as_ref().to_string()))
                    .count()
            }
            None => 0,
        }
    }

    /// Whether this connection should receive events for a community.
    pub fn is_subscribed(&self, connection_id: &str, slug: &str) -> bool {
        match self.connections.get(connection_id) {
            Some(entry) => entry.lock().subscriptions.contains(slug),
            None => false,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// How many live connections are attached to a community.
    pub fn subscriber_count(&self, slug: &str) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.value().lock().subscriptions.contains(slug))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_is_idempotent() {
        let registry = ConnectionRegistry::new();
        registry.register("conn_1");

        assert!(registry.subscribe("conn_1", "rpg"));
        assert!(!registry.subscribe("conn_1", "rpg"));
        assert!(registry.is_subscribed("conn_1", "rpg"));
        assert!(!registry.is_subscribed("conn_1", "fps"));
    }

    #[test]
    fn subscribe_many_counts_only_new_pairs() {
        let registry = ConnectionRegistry::new();
        registry.register("conn_1");

        assert_eq!(registry.subscribe_many("conn_1", ["rpg", "fps"]), 2);
        // Replaying the same set is a no-op.
        assert_eq!(registry.subscribe_many("conn_1", ["rpg", "fps"]), 0);
        assert_eq!(registry.subscribe_many("conn_1", ["rpg", "moba"]), 1);
    }

    #[test]
    fn unregister_destroys_subscriptions() {
        let registry = ConnectionRegistry::new();
        registry.register("conn_1");
        registry.subscribe("conn_1", "rpg");

        registry.unregister("conn_1");
        assert!(!registry.is_subscribed("conn_1", "rpg"));
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn unknown_connection_is_inert() {
        let registry = ConnectionRegistry::new();

        assert!(!registry.subscribe("conn_missing", "rpg"));
        assert_eq!(registry.subscribe_many("conn_missing", ["rpg"]), 0);
        assert!(!registry.is_subscribed("conn_missing", "rpg"));
        assert!(registry.user_of("conn_missing").is_none());
    }

    #[test]
    fn tracks_connection_user() {
        let registry = ConnectionRegistry::new();
        registry.register("conn_1");

        assert!(registry.user_of("conn_1").is_none());
        registry.set_user("conn_1", "usr_1");
        assert_eq!(registry.user_of("conn_1").as_deref(), Some("usr_1"));
    }

    #[test]
    fn subscriptions_are_per_connection() {
        let registry = ConnectionRegistry::new();
        registry.register("conn_1");
        registry.register("conn_2");

        registry.subscribe("conn_1", "rpg");
        assert!(!registry.is_subscribed("conn_2", "rpg"));
    }

    #[test]
    fn counts_subscribers_per_community() {
        let registry = ConnectionRegistry::new();
        registry.register("conn_1");
        registry.register("conn_2");
        registry.subscribe("conn_1", "rpg");
        registry.subscribe("conn_2", "rpg");
        registry.subscribe("conn_2", "fps");

        assert_eq!(registry.subscriber_count("rpg"), 2);
        assert_eq!(registry.subscriber_count("fps"), 1);
        assert_eq!(registry.subscriber_count("moba"), 0);
    }
}
