//! Snapshot store handle
//!
//! The store is never held open between calls. Each query opens its own
//! read-only connection, so a database file replaced by rename is picked up
//! by the next call while calls already running keep reading the old file.

use crate::LibraryError;
use crate::catalog::SnapshotCatalog;
use psdb_config::{DEFAULT_TABLE_PREFIX, StoreConfig};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Location of the snapshot database and the naming of its snapshot tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
    table_prefix: String,
}

impl SnapshotStore {
    /// Store at `path` using the default table prefix
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    /// Use a different snapshot table prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.path).with_prefix(config.table_prefix.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Open a read-only connection.
    ///
    /// Fails with [`LibraryError::StoreMissing`] when no database file has
    /// been installed yet, and with [`LibraryError::StoreUnavailable`] when
    /// the file exists but cannot be opened as SQLite.
    pub fn connect(&self) -> Result<Connection, LibraryError> {
        if !self.path.exists() {
            tracing::debug!("No database at {}", self.path.display());
            return Err(LibraryError::StoreMissing(self.path.clone()));
        }

        open_read_only(&self.path)
    }

    /// Count the snapshot tables in the store
    pub fn snapshot_count(&self) -> Result<usize, LibraryError> {
        let conn = self.connect()?;
        let snapshots = SnapshotCatalog::new(&conn, &self.table_prefix).list_all()?;
        Ok(snapshots.len())
    }
}

/// Open `path` read-only and make sure it is a readable SQLite database
fn open_read_only(path: &Path) -> Result<Connection, LibraryError> {
    let unavailable = |source| LibraryError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(unavailable)?;

    // SQLite opens lazily; the header is only checked on first read.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(unavailable)?;

    Ok(conn)
}

/// Quote an SQL identifier (table or column name) for interpolation
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
