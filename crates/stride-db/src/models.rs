//! DB-side types that differ from the wire types in stride-types.
//! Messages and songs are written straight from their request types; users are not,
//! because the password is hashed before it reaches the store.

use stride_types::models::User;
use stride_types::patch::Patch;

/// A stored user together with its password hash.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    pub password_hash: String,
}

impl UserRow {
    pub fn into_public(self) -> User {
        self.user
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: Option<String>,
    pub password_hash: String,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Patch<String>,
    pub password_hash: Patch<String>,
    pub email: Patch<String>,
    pub profile_picture: Patch<String>,
    pub bio: Patch<String>,
    pub level: Patch<u32>,
    pub total_distance: Patch<f64>,
    pub total_time: Patch<u64>,
}
