//! Wire-format events shared by the hub gateway and the client SDK.
//!
//! Every WebSocket text frame carries one JSON envelope of the form
//! `{"event": <name>, "data": <payload>}`. Payload field names are part of
//! the protocol and are kept as-is (`genreName`, `user_id`, `_id`,
//! `createdAt`) even where they clash with Rust naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event names as they appear on the wire.
pub struct EventName;

impl EventName {
    pub const SYNC_MY_COMMUNITIES: &'static str = "sync-my-communities";
    pub const JOIN_COMMUNITY: &'static str = "join-community";
    pub const SEND_MESSAGE: &'static str = "send-message";
    pub const RECEIVE_MESSAGE: &'static str = "receive-message";
}

// ---------------------------------------------------------------------------
// Client → backend
// ---------------------------------------------------------------------------

/// An event emitted by a client over the gateway connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Attach this connection to every community the user is a member of.
    /// Fire-and-forget; the backend must treat repeats as no-ops.
    #[serde(rename = "sync-my-communities")]
    SyncMyCommunities(Vec<String>),

    /// Create or reuse a subscription for one community.
    #[serde(rename = "join-community")]
    JoinCommunity(JoinCommunity),

    /// Append a message to a community and fan it out to subscribers.
    #[serde(rename = "send-message")]
    SendMessage(SendMessage),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SyncMyCommunities(_) => EventName::SYNC_MY_COMMUNITIES,
            ClientEvent::JoinCommunity(_) => EventName::JOIN_COMMUNITY,
            ClientEvent::SendMessage(_) => EventName::SEND_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinCommunity {
    #[serde(rename = "genreName")]
    pub genre_name: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMessage {
    pub genre: String,
    pub content: String,
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Backend → client
// ---------------------------------------------------------------------------

/// An event dispatched by the backend to subscribed connections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "receive-message")]
    ReceiveMessage(WireMessage),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ReceiveMessage(_) => EventName::RECEIVE_MESSAGE,
        }
    }
}

/// A chat message as it travels on the wire and in history responses.
///
/// Immutable once the backend has assigned `_id` and `createdAt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    #[serde(rename = "_id")]
    pub id: i64,
    pub genre: String,
    pub content: String,
    pub sender: WireSender,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireSender {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

/// Directory entry returned by `GET /api/v1/communities`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunitySummary {
    pub slug: String,
    pub name: String,
    #[serde(rename = "memberCount")]
    pub member_count: i64,
}
