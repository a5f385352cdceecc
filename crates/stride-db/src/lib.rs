pub mod error;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod songs;
pub mod users;

mod codec;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::info;

pub use error::{DbError, DbResult};
pub use messages::Messages;
pub use repository::Repository;
pub use songs::Songs;
pub use users::Users;

/// Process-wide store handle. One SQLite connection, serialized behind a mutex:
/// every repository operation holds the lock for its whole read/modify/write.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers from outside the process (backups, sqlite3 CLI)
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fresh private database, used by tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        f(&conn)
    }

    /// Flush and close the connection. A poisoned lock is still closed.
    pub fn close(self) -> DbResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| DbError::from(e))?;
        info!("Database closed");
        Ok(())
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }

    pub fn songs(&self) -> Songs<'_> {
        Songs::new(self)
    }
}
