use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};
use stride_types::api::UserQuery;
use stride_types::models::User;
use tracing::debug;
use uuid::Uuid;

use crate::codec::{
    check_non_negative, decode_id, decode_ids, decode_time, encode_ids, encode_time, parse_id,
    required_text, set_required, set_required_text,
};
use crate::models::{NewUser, UserChanges, UserRow};
use crate::{Database, DbError, DbResult, Repository};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    password_hash,
    email,
    profile_picture,
    bio,
    level,
    total_distance,
    total_time,
    activities,
    achievements,
    challenges_completed,
    created_at,
    updated_at
FROM users";

pub struct Users<'a> {
    db: &'a Database,
}

impl<'a> Users<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.db
            .with_conn(|conn| query_one(conn, "username = ?1", username))
    }

    /// Append an activity reference in a single statement.
    pub fn add_activity(&self, id: &str, activity_id: Uuid) -> DbResult<Option<UserRow>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET activities = json_insert(activities, '$[#]', ?2), updated_at = ?3
                 WHERE id = ?1",
                params![id, activity_id.to_string(), encode_time(Utc::now())],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_one(conn, "id = ?1", &id)
        })
    }
}

impl Repository for Users<'_> {
    type Record = UserRow;
    type New = NewUser;
    type Patch = UserChanges;
    type Filter = UserQuery;

    fn create(&self, new: NewUser) -> DbResult<UserRow> {
        let username = required_text(new.username, "username")?;
        if new.password_hash.is_empty() {
            return Err(DbError::Validation("password is required".into()));
        }

        let now = Utc::now();
        let row = UserRow {
            user: User {
                id: Uuid::new_v4(),
                username,
                email: new.email,
                profile_picture: new.profile_picture,
                bio: new.bio,
                level: 1,
                total_distance: 0.0,
                total_time: 0,
                activities: Vec::new(),
                achievements: Vec::new(),
                challenges_completed: Vec::new(),
                created_at: now,
                updated_at: now,
            },
            password_hash: new.password_hash,
        };

        self.db.with_conn(|conn| insert(conn, &row))?;
        debug!(user_id = %row.user.id, username = %row.user.username, "user created");
        Ok(row)
    }

    fn get_by_id(&self, id: &str) -> DbResult<Option<UserRow>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| query_one(conn, "id = ?1", &id))
    }

    fn get_all(&self, filter: &UserQuery) -> DbResult<Vec<UserRow>> {
        let (where_sql, values) = match &filter.username {
            Some(username) => (" WHERE username = ?1", vec![Value::Text(username.clone())]),
            None => ("", Vec::new()),
        };
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL}{where_sql} ORDER BY rowid"))?;
            let raws = stmt
                .query_map(params_from_iter(values), RawUser::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            raws.into_iter().map(RawUser::decode).collect()
        })
    }

    fn update(&self, id: &str, changes: UserChanges) -> DbResult<Option<UserRow>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let Some(mut row) = query_one(conn, "id = ?1", &id)? else {
                return Ok(None);
            };
            apply_changes(&mut row, changes)?;
            row.user.updated_at = Utc::now();
            write(conn, &row)?;
            Ok(Some(row))
        })
    }

    fn delete(&self, id: &str) -> DbResult<Option<UserRow>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let Some(row) = query_one(conn, "id = ?1", &id)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM users WHERE id = ?1", [&id])?;
            debug!(user_id = %id, "user deleted");
            Ok(Some(row))
        })
    }
}

fn apply_changes(row: &mut UserRow, changes: UserChanges) -> DbResult<()> {
    let user = &mut row.user;
    set_required_text(changes.username, &mut user.username, "username")?;
    set_required(changes.password_hash, &mut row.password_hash, "password")?;
    changes.email.apply_to(&mut user.email);
    changes.profile_picture.apply_to(&mut user.profile_picture);
    changes.bio.apply_to(&mut user.bio);
    set_required(changes.level, &mut user.level, "level")?;
    set_required(changes.total_distance, &mut user.total_distance, "totalDistance")?;
    check_non_negative(user.total_distance, "totalDistance")?;
    set_required(changes.total_time, &mut user.total_time, "totalTime")?;
    Ok(())
}

fn total_time_column(user: &User) -> DbResult<i64> {
    i64::try_from(user.total_time)
        .map_err(|_| DbError::Validation("totalTime is out of range".into()))
}

fn insert(conn: &Connection, row: &UserRow) -> DbResult<()> {
    let user = &row.user;
    conn.execute(
        "INSERT INTO users (
            id, username, password_hash, email, profile_picture, bio, level,
            total_distance, total_time, activities, achievements, challenges_completed,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            user.id.to_string(),
            user.username,
            row.password_hash,
            user.email,
            user.profile_picture,
            user.bio,
            user.level,
            user.total_distance,
            total_time_column(user)?,
            encode_ids(&user.activities)?,
            encode_ids(&user.achievements)?,
            encode_ids(&user.challenges_completed)?,
            encode_time(user.created_at),
            encode_time(user.updated_at),
        ],
    )
    .map_err(username_conflict)?;
    Ok(())
}

fn write(conn: &Connection, row: &UserRow) -> DbResult<()> {
    let user = &row.user;
    conn.execute(
        "UPDATE users SET
            username = ?2,
            password_hash = ?3,
            email = ?4,
            profile_picture = ?5,
            bio = ?6,
            level = ?7,
            total_distance = ?8,
            total_time = ?9,
            updated_at = ?10
        WHERE id = ?1",
        params![
            user.id.to_string(),
            user.username,
            row.password_hash,
            user.email,
            user.profile_picture,
            user.bio,
            user.level,
            user.total_distance,
            total_time_column(user)?,
            encode_time(user.updated_at),
        ],
    )
    .map_err(username_conflict)?;
    Ok(())
}

fn username_conflict(err: rusqlite::Error) -> DbError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            DbError::Conflict("Username already exists".into())
        }
        other => other.into(),
    }
}

fn query_one(conn: &Connection, predicate: &str, value: &str) -> DbResult<Option<UserRow>> {
    let raw = conn
        .query_row(
            &format!("{USER_SELECT_SQL} WHERE {predicate}"),
            [value],
            RawUser::from_row,
        )
        .optional()?;
    raw.map(RawUser::decode).transpose()
}

/// Columns as SQLite hands them back, before decoding.
struct RawUser {
    id: String,
    username: String,
    password_hash: String,
    email: Option<String>,
    profile_picture: Option<String>,
    bio: Option<String>,
    level: u32,
    total_distance: f64,
    total_time: i64,
    activities: String,
    achievements: String,
    challenges_completed: String,
    created_at: String,
    updated_at: String,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            email: row.get(3)?,
            profile_picture: row.get(4)?,
            bio: row.get(5)?,
            level: row.get(6)?,
            total_distance: row.get(7)?,
            total_time: row.get(8)?,
            activities: row.get(9)?,
            achievements: row.get(10)?,
            challenges_completed: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn decode(self) -> DbResult<UserRow> {
        let total_time = u64::try_from(self.total_time)
            .map_err(|_| DbError::Corrupt(format!("total_time {} on user {}", self.total_time, self.id)))?;
        Ok(UserRow {
            user: User {
                id: decode_id(&self.id, "users.id")?,
                username: self.username,
                email: self.email,
                profile_picture: self.profile_picture,
                bio: self.bio,
                level: self.level,
                total_distance: self.total_distance,
                total_time,
                activities: decode_ids(&self.activities, "users.activities")?,
                achievements: decode_ids(&self.achievements, "users.achievements")?,
                challenges_completed: decode_ids(
                    &self.challenges_completed,
                    "users.challenges_completed",
                )?,
                created_at: decode_time(&self.created_at, "users.created_at")?,
                updated_at: decode_time(&self.updated_at, "users.updated_at")?,
            },
            password_hash: self.password_hash,
        })
    }
}
