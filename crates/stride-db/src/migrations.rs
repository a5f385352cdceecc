use rusqlite::Connection;
use tracing::info;

use crate::DbResult;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version = current_version(conn)?;

    if version < 1 {
        info!("Running migration v1 (users, messages, songs)");
        // Reference columns are plain TEXT: deleting a user must never cascade into
        // or be blocked by the messages that mention it.
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                   TEXT PRIMARY KEY,
                username             TEXT NOT NULL UNIQUE,
                password_hash        TEXT NOT NULL,
                email                TEXT,
                profile_picture      TEXT,
                bio                  TEXT,
                level                INTEGER NOT NULL DEFAULT 1,
                total_distance       REAL NOT NULL DEFAULT 0,
                total_time           INTEGER NOT NULL DEFAULT 0,
                activities           TEXT NOT NULL DEFAULT '[]',
                achievements         TEXT NOT NULL DEFAULT '[]',
                challenges_completed TEXT NOT NULL DEFAULT '[]',
                created_at           TEXT NOT NULL,
                updated_at           TEXT NOT NULL
            );

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                sender      TEXT NOT NULL,
                receiver    TEXT NOT NULL,
                content     TEXT NOT NULL,
                date        TEXT NOT NULL,
                reply_to    TEXT
            );

            CREATE INDEX idx_messages_sender ON messages(sender);
            CREATE INDEX idx_messages_receiver ON messages(receiver);

            CREATE TABLE songs (
                id               TEXT PRIMARY KEY,
                title            TEXT NOT NULL,
                artist           TEXT NOT NULL,
                genre            TEXT,
                bpm              REAL,
                album            TEXT,
                duration_seconds INTEGER
            );

            CREATE INDEX idx_songs_artist ON songs(artist);
            CREATE INDEX idx_songs_genre ON songs(genre);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

pub fn current_version(conn: &Connection) -> DbResult<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}
