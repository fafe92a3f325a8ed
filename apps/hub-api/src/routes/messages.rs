//! Message history endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use gamerhub_common::normalize_slug;
use gamerhub_common::wire::WireMessage;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/messages/{community}", get(list_messages))
}

// ---------------------------------------------------------------------------
// GET /api/v1/messages/{community}
// ---------------------------------------------------------------------------

/// Ordered backlog for a community, oldest first. Side-effect free, and an
/// unknown community is just an empty backlog; clients seed their view
/// from this on every (re)join.
async fn list_messages(
    State(state): State<AppState>,
    Path(community): Path<String>,
) -> Json<Vec<WireMessage>> {
    Json(state.messages.history(&normalize_slug(&community)))
}
