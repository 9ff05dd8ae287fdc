use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{LibraryError, LibraryResult};

/// Owned handle to the on-disk library. It only remembers where the SQLite file
/// lives; every operation opens its own connection through [`Library::connect`]
/// and drops it before returning, so nothing keeps the file locked between
/// key presses.
#[derive(Debug, Clone)]
pub struct Library {
    path: PathBuf,
}

impl Library {
    /// Make sure the data directory and the `books` table exist, then hand back
    /// the handle. Safe to call on every start.
    pub fn open(path: impl Into<PathBuf>) -> LibraryResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LibraryError::StorageUnavailable {
                path: path.clone(),
                source,
            })?;
        }

        let library = Self { path };
        library.initialize()?;
        info!(path = %library.path.display(), "library opened");
        Ok(library)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the `books` table if it is missing. Idempotent. SQLite opens the
    /// file lazily, so a bad path often only fails here.
    pub fn initialize(&self) -> LibraryResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                year INTEGER,
                genre TEXT,
                read_status BOOLEAN
            )",
            [],
        )
        .map_err(|err| LibraryError::unavailable(&self.path, err))?;
        Ok(())
    }

    /// Open a fresh connection scoped to the caller. Failing to open the file is
    /// reported as an unavailable store instead of a plain SQL error.
    pub(crate) fn connect(&self) -> LibraryResult<Connection> {
        debug!(path = %self.path.display(), "opening connection");
        Connection::open(&self.path).map_err(|err| LibraryError::unavailable(&self.path, err))
    }
}
