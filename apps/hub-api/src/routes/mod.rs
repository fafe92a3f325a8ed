pub mod communities;
pub mod health;
pub mod messages;
pub mod users;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest(
            "/api/v1",
            communities::router()
                .merge(messages::router())
                .merge(users::router()),
        )
}
