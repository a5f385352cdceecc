use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use stride_db::Repository;
use stride_db::models::{NewUser, UserChanges};
use stride_types::api::{
    AddActivityRequest, CreateUserRequest, LoginRequest, UpdateUserRequest, UserQuery,
};
use stride_types::models::User;
use stride_types::patch::Patch;

use crate::error::ApiError;
use crate::password::{hash_password, verify_password, verify_unknown_user};
use crate::state::{AppState, with_db};

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("password is required".into()))?;

    // Hash on the blocking pool together with the insert
    let user = with_db(&state, move |db| {
        let password_hash = hash_password(&password)?;
        let row = db.users().create(NewUser {
            username: req.username,
            password_hash,
            email: req.email,
            profile_picture: req.profile_picture,
            bio: req.bio,
        })?;
        Ok(row.into_public())
    })
    .await?;

    info!(user_id = %user.id, username = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let Query(filter) = query?;
    let users = with_db(&state, move |db| {
        let rows = db.users().get_all(&filter)?;
        Ok(rows.into_iter().map(|r| r.into_public()).collect())
    })
    .await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let lookup = id.clone();
    let row = with_db(&state, move |db| Ok(db.users().get_by_id(&lookup)?)).await?;
    row.map(|r| Json(r.into_public()))
        .ok_or_else(|| ApiError::not_found("User", id))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(req) = payload?;
    if matches!(&req.password, Patch::Value(p) if p.is_empty()) {
        return Err(ApiError::Validation("password cannot be empty".into()));
    }

    let lookup = id.clone();
    let row = with_db(&state, move |db| {
        let changes = UserChanges {
            username: req.username,
            password_hash: match req.password {
                Patch::Value(p) => Patch::Value(hash_password(&p)?),
                Patch::Null => Patch::Null,
                Patch::Absent => Patch::Absent,
            },
            email: req.email,
            profile_picture: req.profile_picture,
            bio: req.bio,
            level: req.level,
            total_distance: req.total_distance,
            total_time: req.total_time,
        };
        Ok(db.users().update(&lookup, changes)?)
    })
    .await?;

    row.map(|r| Json(r.into_public()))
        .ok_or_else(|| ApiError::not_found("User", id))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let lookup = id.clone();
    let row = with_db(&state, move |db| Ok(db.users().delete(&lookup)?)).await?;
    let user = row
        .map(|r| r.into_public())
        .ok_or_else(|| ApiError::not_found("User", id))?;

    info!(user_id = %user.id, "User deleted");
    Ok(Json(user))
}

/// Credential check only: no token or session is issued.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(req) = payload?;
    let present = |v: Option<String>| v.filter(|v| !v.is_empty());
    let (Some(username), Some(password)) = (present(req.username), present(req.password)) else {
        return Err(ApiError::Validation(
            "Please provide username and password".into(),
        ));
    };

    let user = with_db(&state, move |db| {
        let Some(row) = db.users().get_by_username(&username)? else {
            verify_unknown_user(&password)?;
            debug!(%username, "login rejected: unknown username");
            return Err(ApiError::InvalidCredentials);
        };
        if !verify_password(&password, &row.password_hash)? {
            debug!(%username, "login rejected: password mismatch");
            return Err(ApiError::InvalidCredentials);
        }
        Ok(row.into_public())
    })
    .await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

pub async fn add_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AddActivityRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(req) = payload?;
    let lookup = id.clone();
    let row = with_db(&state, move |db| {
        Ok(db.users().add_activity(&lookup, req.activity_id)?)
    })
    .await?;

    row.map(|r| Json(r.into_public()))
        .ok_or_else(|| ApiError::not_found("User", id))
}
