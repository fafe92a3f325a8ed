//! Membership replay: re-attach the connection to every known community.

use std::sync::Arc;

use gamerhub_common::wire::ClientEvent;

use crate::connection::EventSink;
use crate::error::SdkError;
use crate::session::SessionState;

/// Builds the fire-and-forget `sync-my-communities` event from the
/// persisted session. Sent once per session mount and again after every
/// reconnect; the backend treats repeated attachment as a no-op, so
/// replaying is always safe.
pub struct MembershipSynchronizer {
    session: Arc<SessionState>,
}

impl MembershipSynchronizer {
    pub fn new(session: Arc<SessionState>) -> Self {
        Self { session }
    }

    /// The replay event, or `None` when the user has no persisted
    /// memberships (nothing to attach).
    pub fn replay_event(&self) -> Option<ClientEvent> {
        let slugs = self.session.communities();
        if slugs.is_empty() {
            return None;
        }
        Some(ClientEvent::SyncMyCommunities(slugs))
    }

    /// Emit the replay event through `sink`. Returns whether anything was
    /// sent.
    pub async fn sync<S: EventSink>(&self, sink: &S) -> Result<bool, SdkError> {
        match self.replay_event() {
            Some(event) => {
                sink.emit(event).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
