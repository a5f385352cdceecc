use stride_db::models::{NewUser, UserChanges};
use stride_db::{Database, DbError, Repository};
use stride_types::api::UserQuery;
use stride_types::patch::Patch;
use uuid::Uuid;

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: Some(username.to_string()),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        email: Some(format!("{username}@example.com")),
        profile_picture: None,
        bio: Some("trail runner".to_string()),
    }
}

#[test]
fn create_and_get_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    let users = db.users();

    let created = users.create(new_user("ana")).unwrap();
    let loaded = users
        .get_by_id(&created.user.id.to_string())
        .unwrap()
        .unwrap();

    assert_eq!(loaded.user, created.user);
    assert_eq!(loaded.user.username, "ana");
    assert_eq!(loaded.user.email.as_deref(), Some("ana@example.com"));
    assert_eq!(loaded.user.level, 1);
    assert_eq!(loaded.user.total_distance, 0.0);
    assert!(loaded.user.activities.is_empty());
    assert_eq!(loaded.password_hash, created.password_hash);
}

#[test]
fn username_is_required() {
    let db = Database::open_in_memory().unwrap();
    let mut user = new_user("ana");
    user.username = None;
    assert!(matches!(db.users().create(user), Err(DbError::Validation(_))));

    let mut blank = new_user("ana");
    blank.username = Some("  ".to_string());
    assert!(matches!(db.users().create(blank), Err(DbError::Validation(_))));
}

#[test]
fn duplicate_username_conflicts() {
    let db = Database::open_in_memory().unwrap();
    db.users().create(new_user("ana")).unwrap();
    let err = db.users().create(new_user("ana")).unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}

#[test]
fn get_by_username() {
    let db = Database::open_in_memory().unwrap();
    db.users().create(new_user("ana")).unwrap();
    db.users().create(new_user("ben")).unwrap();

    let ben = db.users().get_by_username("ben").unwrap().unwrap();
    assert_eq!(ben.user.username, "ben");
    assert!(db.users().get_by_username("carl").unwrap().is_none());
}

#[test]
fn get_all_with_and_without_filter() {
    let db = Database::open_in_memory().unwrap();
    db.users().create(new_user("ana")).unwrap();
    db.users().create(new_user("ben")).unwrap();

    let all = db.users().get_all(&UserQuery::default()).unwrap();
    let names: Vec<_> = all.iter().map(|r| r.user.username.as_str()).collect();
    assert_eq!(names, ["ana", "ben"]);

    let filtered = db
        .users()
        .get_all(&UserQuery {
            username: Some("ben".to_string()),
        })
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].user.username, "ben");
}

#[test]
fn missing_id_is_none_and_malformed_id_is_error() {
    let db = Database::open_in_memory().unwrap();
    let missing = Uuid::new_v4().to_string();

    assert!(db.users().get_by_id(&missing).unwrap().is_none());
    assert!(matches!(
        db.users().get_by_id("60c72b3f9b1d8e3f5c8e4f1b"),
        Err(DbError::InvalidIdentifier(_))
    ));
}

#[test]
fn update_changes_only_patched_fields() {
    let db = Database::open_in_memory().unwrap();
    let created = db.users().create(new_user("ana")).unwrap();
    let id = created.user.id.to_string();

    let updated = db
        .users()
        .update(
            &id,
            UserChanges {
                bio: Patch::Value("ultra runner".to_string()),
                ..UserChanges::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.user.bio.as_deref(), Some("ultra runner"));
    assert_eq!(updated.user.username, created.user.username);
    assert_eq!(updated.user.email, created.user.email);
    assert_eq!(updated.user.level, created.user.level);
    assert_eq!(updated.user.created_at, created.user.created_at);
    assert!(updated.user.updated_at >= created.user.updated_at);
    assert_eq!(updated.password_hash, created.password_hash);

    let reloaded = db.users().get_by_id(&id).unwrap().unwrap();
    assert_eq!(reloaded.user, updated.user);
}

#[test]
fn update_null_clears_optional_and_rejects_required() {
    let db = Database::open_in_memory().unwrap();
    let id = db.users().create(new_user("ana")).unwrap().user.id.to_string();

    let cleared = db
        .users()
        .update(
            &id,
            UserChanges {
                email: Patch::Null,
                ..UserChanges::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(cleared.user.email, None);

    let err = db
        .users()
        .update(
            &id,
            UserChanges {
                username: Patch::Null,
                ..UserChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    let err = db
        .users()
        .update(
            &id,
            UserChanges {
                total_distance: Patch::Value(-5.0),
                ..UserChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[test]
fn update_to_taken_username_conflicts() {
    let db = Database::open_in_memory().unwrap();
    db.users().create(new_user("ana")).unwrap();
    let ben = db.users().create(new_user("ben")).unwrap();

    let err = db
        .users()
        .update(
            &ben.user.id.to_string(),
            UserChanges {
                username: Patch::Value("ana".to_string()),
                ..UserChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}

#[test]
fn update_missing_user_is_none() {
    let db = Database::open_in_memory().unwrap();
    let result = db
        .users()
        .update(&Uuid::new_v4().to_string(), UserChanges::default())
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn delete_then_get_is_none() {
    let db = Database::open_in_memory().unwrap();
    let created = db.users().create(new_user("ana")).unwrap();
    let id = created.user.id.to_string();

    let removed = db.users().delete(&id).unwrap().unwrap();
    assert_eq!(removed.user, created.user);
    assert!(db.users().get_by_id(&id).unwrap().is_none());
    assert!(db.users().delete(&id).unwrap().is_none());
}

#[test]
fn add_activity_appends_references() {
    let db = Database::open_in_memory().unwrap();
    let id = db.users().create(new_user("ana")).unwrap().user.id.to_string();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    db.users().add_activity(&id, first).unwrap().unwrap();
    let user = db.users().add_activity(&id, second).unwrap().unwrap();
    assert_eq!(user.user.activities, vec![first, second]);

    let reloaded = db.users().get_by_id(&id).unwrap().unwrap();
    assert_eq!(reloaded.user.activities, vec![first, second]);

    let missing = db
        .users()
        .add_activity(&Uuid::new_v4().to_string(), first)
        .unwrap();
    assert!(missing.is_none());
}
