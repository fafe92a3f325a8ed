//! Client SDK for the GamerHub messaging backend.
//!
//! One process owns one gateway connection. The pieces layer up like this:
//!
//! - [`Connection`] holds the WebSocket, reconnects with backoff, and
//!   replays the membership sync event on every (re)connect.
//! - [`SessionState`] is the persisted identity plus known community
//!   memberships that drive the replay.
//! - [`HubController`] is the per-view state machine: join a hub, backfill
//!   its history, keep the transcript, send messages.
//! - [`HistoryLoader`] and [`ApiClient`] wrap the HTTP API.
//!
//! Listeners registered with [`Connection::on`] return a handle that
//! unregisters on drop, so a view can scope its listener to its own
//! lifetime.

pub mod api;
pub mod connection;
pub mod error;
pub mod history;
pub mod hub;
pub mod session;
pub mod sync;

pub use api::ApiClient;
pub use connection::{ConnectConfig, Connection, EventSink, ListenerHandle};
pub use error::SdkError;
pub use history::{HistoryFetch, HistoryLoader};
pub use hub::{HubController, HubPhase};
pub use session::SessionState;
pub use sync::MembershipSynchronizer;
