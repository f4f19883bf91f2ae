//! Board shelf storage: connection setup, schema versions and the legacy
//! JSON import.
//!
//! # Responsibility
//! - Open `boards.db` under the data directory, or an in-memory database.
//! - Bring the board schema to the version this build writes.
//! - Pull `boards/index.json` and per-board JSON files in on first open.
//!
//! # Invariants
//! - Repositories only see a connection whose schema is current.
//! - Legacy files are read, never modified or deleted.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod legacy_json;
pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_shelf_db};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or upgrading the board database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// File-system failure while preparing or reading the data directory.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Legacy JSON files exist but cannot be understood.
    LegacyData(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::LegacyData(message) => write!(f, "invalid legacy board index: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::LegacyData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
