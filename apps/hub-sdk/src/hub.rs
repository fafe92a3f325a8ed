//! Per-view hub state machine: one active community at a time, a
//! transcript backfilled from history, live messages folded in.
//!
//! Every join bumps a generation counter and the history response is only
//! applied if the generation is still current, so rapidly switching hubs
//! can never splice an older hub's backlog into the newer hub's
//! transcript. The transcript holds only what the backend echoed back;
//! sending never appends locally.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use gamerhub_common::normalize_slug;
use gamerhub_common::wire::{
    ClientEvent, EventName, JoinCommunity, SendMessage, ServerEvent, WireMessage,
};

use crate::connection::{Connection, EventSink, ListenerHandle};
use crate::error::SdkError;
use crate::history::HistoryFetch;
use crate::session::SessionState;

/// Where the active hub is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubPhase {
    /// No hub is active.
    Unjoined,
    /// Join announced; history backfill still in flight.
    Joining,
    /// History applied; transcript is live.
    Joined,
}

struct ActiveHub {
    slug: String,
    phase: HubPhase,
    transcript: Vec<WireMessage>,
}

#[derive(Default)]
struct HubState {
    generation: u64,
    active: Option<ActiveHub>,
}

pub struct HubController<S, H> {
    sink: Arc<S>,
    history: H,
    session: Arc<SessionState>,
    state: Mutex<HubState>,
}

impl<S: EventSink, H: HistoryFetch> HubController<S, H> {
    pub fn new(sink: Arc<S>, history: H, session: Arc<SessionState>) -> Self {
        Self {
            sink,
            history,
            session,
            state: Mutex::new(HubState::default()),
        }
    }

    /// Make `slug` the active hub: announce the join, record the
    /// membership, backfill the transcript from history. A join while a
    /// previous backfill is still in flight supersedes it.
    pub async fn join_hub(&self, slug: &str) -> Result<(), SdkError> {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return Ok(());
        }

        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.active = Some(ActiveHub {
                slug: slug.clone(),
                phase: HubPhase::Joining,
                transcript: Vec::new(),
            });
            state.generation
        };

        self.sink
            .emit(ClientEvent::JoinCommunity(JoinCommunity {
                genre_name: slug.clone(),
                user_id: self.session.user_id().to_string(),
            }))
            .await?;

        self.session.add_community(&slug);

        let backlog = self.history.fetch(&slug).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(%slug, "discarding stale history response");
            return Ok(());
        }
        if let Some(active) = state.active.as_mut() {
            // Live messages may have arrived while the backfill was in
            // flight; keep the ones the backlog does not already contain.
            let live = std::mem::replace(&mut active.transcript, backlog);
            for message in live {
                if !active.transcript.iter().any(|m| m.id == message.id) {
                    active.transcript.push(message);
                }
            }
            active.phase = HubPhase::Joined;
        }
        Ok(())
    }

    /// Deactivate the current hub, if any. Membership is kept; only the
    /// view state is cleared.
    pub fn leave_hub(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.active = None;
    }

    /// Send `content` to the active hub. Returns `Ok(false)` without
    /// emitting anything when the content is blank or no hub is active.
    /// The echoed message from the backend is what lands in the
    /// transcript.
    pub async fn send_message(&self, content: &str) -> Result<bool, SdkError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }

        let Some(slug) = self.state.lock().active.as_ref().map(|a| a.slug.clone()) else {
            return Ok(false);
        };

        self.sink
            .emit(ClientEvent::SendMessage(SendMessage {
                genre: slug,
                content: content.to_string(),
                user_id: self.session.user_id().to_string(),
            }))
            .await?;
        Ok(true)
    }

    /// Fold a live message into the transcript. Messages for other
    /// communities and ids already present are dropped.
    pub fn handle_incoming(&self, message: &WireMessage) {
        let genre = normalize_slug(&message.genre);

        let mut state = self.state.lock();
        let Some(active) = state.active.as_mut() else {
            tracing::debug!(%genre, "dropping message with no active hub");
            return;
        };
        if active.slug != genre {
            tracing::debug!(%genre, active = %active.slug, "dropping message for inactive hub");
            return;
        }
        if active.transcript.iter().any(|m| m.id == message.id) {
            return;
        }
        active.transcript.push(message.clone());
    }

    /// The active hub's slug, if any.
    pub fn active_hub(&self) -> Option<String> {
        self.state.lock().active.as_ref().map(|a| a.slug.clone())
    }

    pub fn phase(&self) -> HubPhase {
        self.state
            .lock()
            .active
            .as_ref()
            .map(|a| a.phase)
            .unwrap_or(HubPhase::Unjoined)
    }

    /// Snapshot of the active transcript, oldest first.
    pub fn transcript(&self) -> Vec<WireMessage> {
        self.state
            .lock()
            .active
            .as_ref()
            .map(|a| a.transcript.clone())
            .unwrap_or_default()
    }
}

impl<S, H> HubController<S, H>
where
    S: EventSink + Send + Sync + 'static,
    H: HistoryFetch + 'static,
{
    /// Wire this controller to the connection's message stream. Dropping
    /// the returned handle detaches it.
    pub fn attach(self: &Arc<Self>, connection: &Connection) -> ListenerHandle {
        let controller: Weak<Self> = Arc::downgrade(self);
        connection.on(EventName::RECEIVE_MESSAGE, move |event| {
            let Some(controller) = controller.upgrade() else {
                return;
            };
            let ServerEvent::ReceiveMessage(message) = event;
            controller.handle_incoming(message);
        })
    }
}
