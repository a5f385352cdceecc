pub mod error;
pub mod messages;
pub mod password;
pub mod songs;
pub mod state;
pub mod users;

use axum::{Json, Router, routing::{get, post}};
use serde_json::{Value, json};

use crate::state::AppState;

/// Every route, without transport layers (CORS, tracing) which the binary adds.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/login", post(users::login))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/{id}/activities", post(users::add_activity))
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route(
            "/api/messages/{id}",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .route("/api/songs", get(songs::list_songs).post(songs::create_song))
        .route(
            "/api/songs/{id}",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
