//! SQLite persistence.
//!
//! rusqlite connections are blocking and not `Sync`, so every operation opens
//! its own connection and async callers hop onto the blocking pool through
//! [`blocking`].

pub mod catalog;
pub mod schema;
pub mod vehicle_repository;

use crate::error::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use vehicle_repository::VehicleRepository;

/// Concurrent batches write to the same file; give a locked database time to free up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Location of the SQLite database file.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a connection with foreign keys enforced.
    pub fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }
}

/// Runs a blocking database closure on tokio's blocking pool.
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
