//! Column encoding shared by the repositories: identifiers and timestamps are TEXT,
//! reference lists are JSON arrays of identifiers.

use chrono::{DateTime, NaiveDateTime, Utc};
use stride_types::patch::Patch;
use uuid::Uuid;

use crate::{DbError, DbResult};

/// Parse an identifier supplied by a caller.
pub fn parse_id(raw: &str) -> DbResult<Uuid> {
    raw.parse()
        .map_err(|_| DbError::InvalidIdentifier(raw.to_string()))
}

/// Parse an identifier carried inside a record body (`sender`, `replyTo`, ...).
pub fn parse_ref(raw: &str, field: &str) -> DbResult<Uuid> {
    raw.parse()
        .map_err(|_| DbError::Validation(format!("{field} is not a valid identifier")))
}

pub fn decode_id(raw: &str, column: &str) -> DbResult<Uuid> {
    raw.parse()
        .map_err(|e| DbError::Corrupt(format!("{column} '{raw}': {e}")))
}

pub fn encode_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub fn decode_time(raw: &str, column: &str) -> DbResult<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite3 CLI carry datetime('now') format.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| DbError::Corrupt(format!("{column} '{raw}': {e}")))
}

pub fn encode_ids(ids: &[Uuid]) -> DbResult<String> {
    serde_json::to_string(ids).map_err(|e| DbError::Corrupt(e.to_string()))
}

pub fn decode_ids(raw: &str, column: &str) -> DbResult<Vec<Uuid>> {
    serde_json::from_str(raw).map_err(|e| DbError::Corrupt(format!("{column}: {e}")))
}

/// A required text field: present and not blank.
pub fn required_text(value: Option<String>, field: &str) -> DbResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DbError::Validation(format!("{field} is required"))),
    }
}

/// Merge into a field that cannot be null.
pub fn set_required<T>(patch: Patch<T>, slot: &mut T, field: &str) -> DbResult<()> {
    match patch {
        Patch::Absent => Ok(()),
        Patch::Null => Err(DbError::Validation(format!("{field} cannot be null"))),
        Patch::Value(v) => {
            *slot = v;
            Ok(())
        }
    }
}

/// Like [`set_required`], and the new value must not be blank.
pub fn set_required_text(patch: Patch<String>, slot: &mut String, field: &str) -> DbResult<()> {
    match patch {
        Patch::Value(v) => {
            *slot = required_text(Some(v), field)?;
            Ok(())
        }
        other => set_required(other, slot, field),
    }
}

pub fn check_non_negative(value: f64, field: &str) -> DbResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DbError::Validation(format!(
            "{field} must be a non-negative number"
        )))
    }
}
