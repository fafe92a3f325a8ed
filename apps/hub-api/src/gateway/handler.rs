//! Incoming client-event dispatch: sync, join, and send.

use chrono::Utc;

use gamerhub_common::normalize_slug;
use gamerhub_common::wire::{ClientEvent, JoinCommunity, SendMessage, WireMessage, WireSender};

use crate::AppState;

pub fn handle_event(state: &AppState, connection_id: &str, event: ClientEvent) {
    match event {
        ClientEvent::SyncMyCommunities(slugs) => handle_sync(state, connection_id, slugs),
        ClientEvent::JoinCommunity(join) => handle_join(state, connection_id, join),
        ClientEvent::SendMessage(send) => handle_send(state, connection_id, send),
    }
}

/// Attach the connection to every community the user is a persisted member
/// of. Fire-and-forget and idempotent: a replayed set creates no duplicate
/// subscriptions, so reconnecting clients can always resend it.
fn handle_sync(state: &AppState, connection_id: &str, slugs: Vec<String>) {
    let slugs: Vec<String> = slugs
        .iter()
        .map(|s| normalize_slug(s))
        .filter(|s| !s.is_empty())
        .collect();

    for slug in &slugs {
        state.communities.ensure(slug);
    }
    let added = state.registry.subscribe_many(connection_id, &slugs);

    tracing::debug!(
        %connection_id,
        total = slugs.len(),
        added,
        "synced community subscriptions"
    );
}

/// Create or reuse the subscription for one community and record the
/// membership behind the memberCount aggregate.
fn handle_join(state: &AppState, connection_id: &str, join: JoinCommunity) {
    let slug = normalize_slug(&join.genre_name);
    if slug.is_empty() {
        tracing::debug!(%connection_id, "ignoring join-community with empty slug");
        return;
    }

    let new_member = state.communities.add_member(&slug, &join.user_id);
    let new_subscription = state.registry.subscribe(connection_id, &slug);
    state.registry.set_user(connection_id, &join.user_id);

    tracing::debug!(
        %connection_id,
        %slug,
        user_id = %join.user_id,
        new_member,
        new_subscription,
        "join-community"
    );
}

/// Append a message at the community's single ordering point and fan it out
/// to every subscribed connection, the sender's included.
fn handle_send(state: &AppState, connection_id: &str, send: SendMessage) {
    let slug = normalize_slug(&send.genre);
    let content = send.content.trim();
    if slug.is_empty() || content.is_empty() {
        tracing::debug!(%connection_id, "dropping empty send-message");
        return;
    }

    state.communities.ensure(&slug);

    let message = WireMessage {
        id: state.snowflake.generate(),
        genre: slug,
        content: content.to_string(),
        sender: WireSender {
            user_name: state.users.display_name(&send.user_id),
            id: send.user_id,
        },
        created_at: Utc::now(),
    };

    state.messages.append_and_dispatch(&state.broadcast, message);
}
