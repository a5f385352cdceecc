use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use stride_db::Repository;
use stride_types::api::{CreateMessageRequest, MessageQuery, UpdateMessageRequest};
use stride_types::models::{Message, PopulatedMessage};

use crate::error::ApiError;
use crate::state::{AppState, with_db};

pub async fn create_message(
    State(state): State<AppState>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let message = with_db(&state, move |db| Ok(db.messages().create(req)?)).await?;

    info!(message_id = %message.id, sender = %message.sender, receiver = %message.receiver, "Message created");
    Ok((StatusCode::CREATED, Json(message)))
}

/// All messages, sender and receiver resolved to `{id, username}`.
pub async fn list_messages(
    State(state): State<AppState>,
    query: Result<Query<MessageQuery>, QueryRejection>,
) -> Result<Json<Vec<PopulatedMessage>>, ApiError> {
    let Query(filter) = query?;
    let messages =
        with_db(&state, move |db| Ok(db.messages().get_all_populated(&filter)?)).await?;
    Ok(Json(messages))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PopulatedMessage>, ApiError> {
    let lookup = id.clone();
    let message = with_db(&state, move |db| Ok(db.messages().get_populated(&lookup)?)).await?;
    message
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Message", id))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(req) = payload?;
    let lookup = id.clone();
    let message = with_db(&state, move |db| Ok(db.messages().update(&lookup, req)?)).await?;
    message
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Message", id))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let lookup = id.clone();
    let message = with_db(&state, move |db| Ok(db.messages().delete(&lookup)?))
        .await?
        .ok_or_else(|| ApiError::not_found("Message", id))?;

    info!(message_id = %message.id, "Message deleted");
    Ok(Json(message))
}
