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
use stride_types::api::{CreateSongRequest, SongQuery, UpdateSongRequest};
use stride_types::models::Song;

use crate::error::ApiError;
use crate::state::{AppState, with_db};

pub async fn create_song(
    State(state): State<AppState>,
    payload: Result<Json<CreateSongRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let song = with_db(&state, move |db| Ok(db.songs().create(req)?)).await?;

    info!(song_id = %song.id, title = %song.title, "Song created");
    Ok((StatusCode::CREATED, Json(song)))
}

/// `?title=&artist=&genre=` match exactly; `?bpm=` matches tempos within 20 bpm.
pub async fn list_songs(
    State(state): State<AppState>,
    query: Result<Query<SongQuery>, QueryRejection>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let Query(filter) = query?;
    let songs = with_db(&state, move |db| Ok(db.songs().get_all(&filter)?)).await?;
    Ok(Json(songs))
}

pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    let lookup = id.clone();
    let song = with_db(&state, move |db| Ok(db.songs().get_by_id(&lookup)?)).await?;
    song.map(Json).ok_or_else(|| ApiError::not_found("Song", id))
}

pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSongRequest>, JsonRejection>,
) -> Result<Json<Song>, ApiError> {
    let Json(req) = payload?;
    let lookup = id.clone();
    let song = with_db(&state, move |db| Ok(db.songs().update(&lookup, req)?)).await?;
    song.map(Json).ok_or_else(|| ApiError::not_found("Song", id))
}

pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    let lookup = id.clone();
    let song = with_db(&state, move |db| Ok(db.songs().delete(&lookup)?))
        .await?
        .ok_or_else(|| ApiError::not_found("Song", id))?;

    info!(song_id = %song.id, "Song deleted");
    Ok(Json(song))
}
