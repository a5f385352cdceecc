use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::patch::Patch;

// Required fields are `Option` on the way in so a missing field surfaces as a
// validation error from the repository rather than an opaque decode failure.

// -- Users --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Patch<String>,
    #[serde(default)]
    pub password: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub profile_picture: Patch<String>,
    #[serde(default)]
    pub bio: Patch<String>,
    #[serde(default)]
    pub level: Patch<u32>,
    #[serde(default)]
    pub total_distance: Patch<f64>,
    #[serde(default)]
    pub total_time: Patch<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddActivityRequest {
    pub activity_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub username: Option<String>,
}

// -- Messages --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMessageRequest {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub content: Option<String>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateMessageRequest {
    #[serde(default)]
    pub sender: Patch<String>,
    #[serde(default)]
    pub receiver: Patch<String>,
    #[serde(default)]
    pub content: Patch<String>,
    #[serde(default)]
    pub reply_to: Patch<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    /// Substring match on message content.
    pub content: Option<String>,
}

// -- Songs --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSongRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub bpm: Option<f64>,
    pub album: Option<String>,
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSongRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub artist: Patch<String>,
    #[serde(default)]
    pub genre: Patch<String>,
    #[serde(default)]
    pub bpm: Patch<f64>,
    #[serde(default)]
    pub album: Patch<String>,
    #[serde(default)]
    pub duration_seconds: Patch<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongQuery {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    /// Tempo proximity: songs whose bpm is within 20 of this value.
    pub bpm: Option<f64>,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
