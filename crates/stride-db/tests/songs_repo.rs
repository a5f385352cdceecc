use stride_db::{Database, DbError, Repository};
use stride_types::api::{CreateSongRequest, SongQuery, UpdateSongRequest};
use stride_types::models::Song;
use stride_types::patch::Patch;
use uuid::Uuid;

fn song(title: &str, artist: &str, genre: &str, bpm: Option<f64>) -> CreateSongRequest {
    CreateSongRequest {
        title: Some(title.to_string()),
        artist: Some(artist.to_string()),
        genre: Some(genre.to_string()),
        bpm,
        ..CreateSongRequest::default()
    }
}

fn titles(songs: &[Song]) -> Vec<&str> {
    songs.iter().map(|s| s.title.as_str()).collect()
}

#[test]
fn create_and_get_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    let mut req = song("A", "B", "rock", Some(120.0));
    req.album = Some("Side A".to_string());
    req.duration_seconds = Some(215);

    let created = db.songs().create(req).unwrap();
    let loaded = db
        .songs()
        .get_by_id(&created.id.to_string())
        .unwrap()
        .unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.title, "A");
    assert_eq!(loaded.artist, "B");
    assert_eq!(loaded.genre.as_deref(), Some("rock"));
    assert_eq!(loaded.bpm, Some(120.0));
    assert_eq!(loaded.album.as_deref(), Some("Side A"));
    assert_eq!(loaded.duration_seconds, Some(215));
}

#[test]
fn title_and_artist_are_required() {
    let db = Database::open_in_memory().unwrap();

    let mut no_title = song("A", "B", "rock", None);
    no_title.title = None;
    assert!(matches!(db.songs().create(no_title), Err(DbError::Validation(_))));

    let mut no_artist = song("A", "B", "rock", None);
    no_artist.artist = Some(String::new());
    assert!(matches!(db.songs().create(no_artist), Err(DbError::Validation(_))));

    assert!(matches!(
        db.songs().create(song("A", "B", "rock", Some(-1.0))),
        Err(DbError::Validation(_))
    ));
}

#[test]
fn tempo_proximity_is_strict() {
    let db = Database::open_in_memory().unwrap();
    db.songs().create(song("A", "B", "rock", Some(120.0))).unwrap();

    assert_eq!(titles(&db.songs().similar_tempo(125.0).unwrap()), ["A"]);
    // |139 - 120| = 19
    assert_eq!(titles(&db.songs().similar_tempo(139.0).unwrap()), ["A"]);
    // |101 - 120| = 19
    assert_eq!(titles(&db.songs().similar_tempo(101.0).unwrap()), ["A"]);
    // |140 - 120| = 20, on the boundary
    assert!(db.songs().similar_tempo(140.0).unwrap().is_empty());
    assert!(db.songs().similar_tempo(100.0).unwrap().is_empty());
    // |145 - 120| = 25
    assert!(db.songs().similar_tempo(145.0).unwrap().is_empty());
}

#[test]
fn tempo_proximity_skips_songs_without_tempo() {
    let db = Database::open_in_memory().unwrap();
    db.songs().create(song("Slow", "X", "ambient", Some(70.0))).unwrap();
    db.songs().create(song("Steady", "X", "house", Some(124.0))).unwrap();
    db.songs().create(song("Unknown", "X", "house", None)).unwrap();
    db.songs().create(song("Fast", "X", "dnb", Some(174.0))).unwrap();
    db.songs().create(song("Close", "Y", "pop", Some(110.5))).unwrap();

    let near = db.songs().similar_tempo(120.0).unwrap();
    assert_eq!(titles(&near), ["Steady", "Close"]);

    // Tempo combines with the other filters.
    let near_by_x = db
        .songs()
        .get_all(&SongQuery {
            artist: Some("X".to_string()),
            bpm: Some(120.0),
            ..SongQuery::default()
        })
        .unwrap();
    assert_eq!(titles(&near_by_x), ["Steady"]);

    assert!(matches!(
        db.songs().similar_tempo(f64::NAN),
        Err(DbError::Validation(_))
    ));
}

#[test]
fn filters_by_title_artist_and_genre() {
    let db = Database::open_in_memory().unwrap();
    db.songs().create(song("Intro", "Nova", "rock", Some(120.0))).unwrap();
    db.songs().create(song("Outro", "Nova", "pop", Some(96.0))).unwrap();
    db.songs().create(song("Intro", "Lumen", "pop", None)).unwrap();

    let by_title = db
        .songs()
        .get_all(&SongQuery {
            title: Some("Intro".to_string()),
            ..SongQuery::default()
        })
        .unwrap();
    assert_eq!(by_title.len(), 2);

    let by_artist = db
        .songs()
        .get_all(&SongQuery {
            artist: Some("Nova".to_string()),
            ..SongQuery::default()
        })
        .unwrap();
    assert_eq!(titles(&by_artist), ["Intro", "Outro"]);

    let by_genre = db
        .songs()
        .get_all(&SongQuery {
            genre: Some("pop".to_string()),
            ..SongQuery::default()
        })
        .unwrap();
    let artists: Vec<_> = by_genre.iter().map(|s| s.artist.as_str()).collect();
    assert_eq!(artists, ["Nova", "Lumen"]);

    assert_eq!(db.songs().get_all(&SongQuery::default()).unwrap().len(), 3);
}

#[test]
fn update_performs_the_update_and_returns_the_record() {
    let db = Database::open_in_memory().unwrap();
    let created = db.songs().create(song("A", "B", "rock", Some(120.0))).unwrap();
    let id = created.id.to_string();

    let updated = db
        .songs()
        .update(
            &id,
            UpdateSongRequest {
                bpm: Patch::Value(128.0),
                genre: Patch::Null,
                ..UpdateSongRequest::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.bpm, Some(128.0));
    assert_eq!(updated.genre, None);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.artist, created.artist);
    assert_eq!(db.songs().get_by_id(&id).unwrap().unwrap(), updated);

    let err = db
        .songs()
        .update(
            &id,
            UpdateSongRequest {
                title: Patch::Null,
                ..UpdateSongRequest::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[test]
fn missing_and_malformed_ids() {
    let db = Database::open_in_memory().unwrap();
    let missing = Uuid::new_v4().to_string();

    assert!(db.songs().get_by_id(&missing).unwrap().is_none());
    assert!(db
        .songs()
        .update(&missing, UpdateSongRequest::default())
        .unwrap()
        .is_none());
    assert!(db.songs().delete(&missing).unwrap().is_none());
    assert!(matches!(
        db.songs().delete("12"),
        Err(DbError::InvalidIdentifier(_))
    ));
}

#[test]
fn delete_then_get_is_none() {
    let db = Database::open_in_memory().unwrap();
    let created = db.songs().create(song("A", "B", "rock", None)).unwrap();
    let id = created.id.to_string();

    assert_eq!(db.songs().delete(&id).unwrap(), Some(created));
    assert!(db.songs().get_by_id(&id).unwrap().is_none());
}
