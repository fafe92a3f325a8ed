//! Community directory endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use gamerhub_common::wire::CommunitySummary;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/communities", get(list_communities))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities
// ---------------------------------------------------------------------------

async fn list_communities(State(state): State<AppState>) -> Json<Vec<CommunitySummary>> {
    Json(state.communities.list())
}
