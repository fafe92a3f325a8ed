//! User identity endpoints.
//!
//! Identity here is opaque: a stable ID plus display name. Credentials and
//! real authentication live elsewhere; the messaging core only needs to
//! resolve sender names and report a user's memberships.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldError};
use crate::store::users::User;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
}

// ---------------------------------------------------------------------------
// POST /api/v1/users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = body.username.trim();
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(FieldError {
            field: "username".to_string(),
            message: "Username is required".to_string(),
        });
    } else if username.len() > 32 {
        errors.push(FieldError {
            field: "username".to_string(),
            message: "Username must be 32 characters or fewer".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let user = state.users.create(username);
    Ok((StatusCode::CREATED, Json(user)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    /// Slugs of every community the user is a member of.
    pub communities: Vec<String>,
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .users
        .get(&id)
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserProfile {
        communities: state.communities.communities_of(&user.id),
        id: user.id,
        username: user.username,
    }))
}
