//! SQLite-backed store shared by every repository trait.
//!
//! One connection behind a mutex; every multi-statement write runs in a single
//! transaction and every statement binds its values as parameters.

mod clients;
mod matrices;
mod schema;
mod sessions;

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::repository::RepositoryError;

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (and migrates) the database at `path`; `:memory:` opens a private in-memory one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if path == Path::new(IN_MEMORY) {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Cheap round trip used by readiness checks.
    pub fn ping(&self) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Conflict
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => {
                RepositoryError::Corrupt(err.to_string())
            }
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| RepositoryError::Corrupt(format!("timestamp {ms} out of range")))
}

fn from_optional_millis(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    ms.map(from_millis).transpose()
}
