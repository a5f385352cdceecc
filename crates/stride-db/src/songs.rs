use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use stride_types::api::{CreateSongRequest, SongQuery, UpdateSongRequest};
use stride_types::models::Song;
use tracing::debug;
use uuid::Uuid;

use crate::codec::{
    check_non_negative, decode_id, parse_id, required_text, set_required_text,
};
use crate::{Database, DbError, DbResult, Repository};

/// Songs match a tempo query when their bpm is strictly closer than this.
pub const TEMPO_WINDOW: f64 = 20.0;

const SONG_SELECT_SQL: &str = "SELECT id, title, artist, genre, bpm, album, duration_seconds
FROM songs";

pub struct Songs<'a> {
    db: &'a Database,
}

impl<'a> Songs<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Songs whose tempo is within [`TEMPO_WINDOW`] of `bpm`. Songs without a
    /// tempo never match.
    pub fn similar_tempo(&self, bpm: f64) -> DbResult<Vec<Song>> {
        self.get_all(&SongQuery {
            bpm: Some(bpm),
            ..SongQuery::default()
        })
    }
}

impl Repository for Songs<'_> {
    type Record = Song;
    type New = CreateSongRequest;
    type Patch = UpdateSongRequest;
    type Filter = SongQuery;

    fn create(&self, req: CreateSongRequest) -> DbResult<Song> {
        let song = Song {
            id: Uuid::new_v4(),
            title: required_text(req.title, "title")?,
            artist: required_text(req.artist, "artist")?,
            genre: req.genre,
            bpm: req.bpm,
            album: req.album,
            duration_seconds: req.duration_seconds,
        };
        if let Some(bpm) = song.bpm {
            check_non_negative(bpm, "bpm")?;
        }

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO songs (id, title, artist, genre, bpm, album, duration_seconds)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    song.id.to_string(),
                    song.title,
                    song.artist,
                    song.genre,
                    song.bpm,
                    song.album,
                    song.duration_seconds,
                ],
            )?;
            Ok(())
        })?;

        debug!(song_id = %song.id, title = %song.title, "song created");
        Ok(song)
    }

    fn get_by_id(&self, id: &str) -> DbResult<Option<Song>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| query_one(conn, &id))
    }

    fn get_all(&self, filter: &SongQuery) -> DbResult<Vec<Song>> {
        let (where_sql, values) = filter_clause(filter)?;
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SONG_SELECT_SQL}{where_sql} ORDER BY rowid"))?;
            let rows = stmt
                .query_map(params_from_iter(values), RawSong::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(RawSong::decode).collect()
        })
    }

    fn update(&self, id: &str, patch: UpdateSongRequest) -> DbResult<Option<Song>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let Some(mut song) = query_one(conn, &id)? else {
                return Ok(None);
            };
            set_required_text(patch.title, &mut song.title, "title")?;
            set_required_text(patch.artist, &mut song.artist, "artist")?;
            patch.genre.apply_to(&mut song.genre);
            patch.bpm.apply_to(&mut song.bpm);
            if let Some(bpm) = song.bpm {
                check_non_negative(bpm, "bpm")?;
            }
            patch.album.apply_to(&mut song.album);
            patch.duration_seconds.apply_to(&mut song.duration_seconds);

            conn.execute(
                "UPDATE songs SET title = ?2, artist = ?3, genre = ?4, bpm = ?5, album = ?6,
                    duration_seconds = ?7
                 WHERE id = ?1",
                params![
                    id,
                    song.title,
                    song.artist,
                    song.genre,
                    song.bpm,
                    song.album,
                    song.duration_seconds,
                ],
            )?;
            Ok(Some(song))
        })
    }

    fn delete(&self, id: &str) -> DbResult<Option<Song>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let Some(song) = query_one(conn, &id)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM songs WHERE id = ?1", [&id])?;
            debug!(song_id = %id, "song deleted");
            Ok(Some(song))
        })
    }
}

fn filter_clause(filter: &SongQuery) -> DbResult<(String, Vec<Value>)> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    for (column, value) in [
        ("title", &filter.title),
        ("artist", &filter.artist),
        ("genre", &filter.genre),
    ] {
        if let Some(value) = value {
            values.push(Value::Text(value.clone()));
            clauses.push(format!("{column} = ?{}", values.len()));
        }
    }

    if let Some(bpm) = filter.bpm {
        if !bpm.is_finite() {
            return Err(DbError::Validation("bpm must be a finite number".into()));
        }
        values.push(Value::Real(bpm));
        let bpm_idx = values.len();
        values.push(Value::Real(TEMPO_WINDOW));
        clauses.push(format!(
            "bpm IS NOT NULL AND abs(bpm - ?{bpm_idx}) < ?{}",
            values.len()
        ));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    Ok((where_sql, values))
}

fn query_one(conn: &Connection, id: &str) -> DbResult<Option<Song>> {
    let raw = conn
        .query_row(
            &format!("{SONG_SELECT_SQL} WHERE id = ?1"),
            [id],
            RawSong::from_row,
        )
        .optional()?;
    raw.map(RawSong::decode).transpose()
}

struct RawSong {
    id: String,
    title: String,
    artist: String,
    genre: Option<String>,
    bpm: Option<f64>,
    album: Option<String>,
    duration_seconds: Option<u32>,
}

impl RawSong {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            genre: row.get(3)?,
            bpm: row.get(4)?,
            album: row.get(5)?,
            duration_seconds: row.get(6)?,
        })
    }

    fn decode(self) -> DbResult<Song> {
        Ok(Song {
            id: decode_id(&self.id, "songs.id")?,
            title: self.title,
            artist: self.artist,
            genre: self.genre,
            bpm: self.bpm,
            album: self.album,
            duration_seconds: self.duration_seconds,
        })
    }
}
