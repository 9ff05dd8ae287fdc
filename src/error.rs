//! Error taxonomy for the persistence and transfer layers. The UI and `main`
//! keep using `anyhow` for glue; these typed variants exist so callers can
//! tell a bad form entry apart from a broken import file or a missing
//! database.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type LibraryResult<T> = Result<T, LibraryError>;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// Raw input rejected at the boundary (empty title/author, non-numeric
    /// year). Never auto-corrected.
    #[error("{0}")]
    Validation(String),

    /// A transfer file row or header did not match the expected columns. The
    /// whole import is rejected when this is returned.
    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// The database file could not be opened or created.
    #[error("library database at {} is unavailable", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A statement failed on an otherwise healthy connection.
    #[error("storage error")]
    Storage(#[from] rusqlite::Error),

    /// Reading or writing a transfer file failed.
    #[error("could not access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LibraryError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    /// Wrap a connection failure so it reads as an unavailable store rather
    /// than a generic SQL error.
    pub(crate) fn unavailable(path: impl Into<PathBuf>, err: rusqlite::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source: io::Error::other(err),
        }
    }
}
