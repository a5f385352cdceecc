use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a user. The password hash lives only in the DB row type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub level: u32,
    pub total_distance: f64,
    /// Seconds.
    pub total_time: u64,
    pub activities: Vec<Uuid>,
    pub achievements: Vec<Uuid>,
    pub challenges_completed: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved reference to a user inside another record.
/// `username` is `None` when the referenced user has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub content: String,
    pub date: DateTime<Utc>,
    pub reply_to: Option<Uuid>,
}

/// A message with `sender` and `receiver` replaced by user summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedMessage {
    pub id: Uuid,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub content: String,
    pub date: DateTime<Utc>,
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    pub bpm: Option<f64>,
    pub album: Option<String>,
    pub duration_seconds: Option<u32>,
}
