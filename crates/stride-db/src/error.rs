use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Store-level failures. A missing record is not an error here: lookups return `None`.
#[derive(Debug, Error)]
pub enum DbError {
    /// A required field is missing or a value is out of range.
    #[error("{0}")]
    Validation(String),

    /// The caller passed something that is not a record identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Unique constraint (username) would be violated.
    #[error("{0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,

    /// A persisted value failed to decode.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
