//! In-memory user identities. Opaque identity only; credentials are not
//! this service's concern.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use gamerhub_common::id::{prefix, prefixed_ulid};

/// Display name used when a sender has no registered identity.
pub const GUEST_NAME: &str = "Guest";

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

pub struct UserStore {
    users: DashMap<String, User>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    pub fn create(&self, username: &str) -> User {
        let user = User {
            id: prefixed_ulid(prefix::USER),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(user.id.clone(), user.clone());
        user
    }

    pub fn get(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    /// Resolve a sender's display name, falling back for unknown IDs.
    pub fn display_name(&self, user_id: &str) -> String {
        self.users
            .get(user_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| GUEST_NAME.to_string())
    }
}
