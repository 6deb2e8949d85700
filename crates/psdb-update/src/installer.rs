//! Atomic store installation

use crate::UpdateError;
use chrono::NaiveDateTime;
use psdb_library::{LibraryError, SnapshotCatalog, SnapshotStore};
use std::path::Path;

/// Outcome of an installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    /// Size of the installed file
    pub bytes: u64,
    /// Snapshot tables in the installed store
    pub snapshots: usize,
    /// Capture time of the newest snapshot
    pub latest: Option<NaiveDateTime>,
}

/// Validates staged stores and swaps them in
pub struct StoreInstaller {
    table_prefix: String,
}

impl StoreInstaller {
    pub fn new(table_prefix: &str) -> Self {
        Self {
            table_prefix: table_prefix.to_string(),
        }
    }

    /// Replace `target` with `staged`.
    ///
    /// `staged` must sit in the same directory as `target` for the rename to
    /// be atomic. A staged file that is not a usable store is deleted and
    /// `target` is left untouched.
    pub async fn install(&self, staged: &Path, target: &Path) -> Result<InstallResult, UpdateError> {
        let store = SnapshotStore::new(staged).with_prefix(self.table_prefix.clone());

        let checked = tokio::task::spawn_blocking(move || inspect(&store))
            .await
            .map_err(|e| UpdateError::InstallFailed(e.to_string()))?;

        let (snapshots, latest) = match checked {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Rejecting staged store {}: {}", staged.display(), e);
                if staged.exists() {
                    tokio::fs::remove_file(staged).await?;
                }
                return Err(e);
            }
        };

        let bytes = tokio::fs::metadata(staged).await?.len();

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(staged, target).await?;

        Ok(InstallResult {
            bytes,
            snapshots,
            latest,
        })
    }
}

/// Snapshot count and newest capture time of a staged store
fn inspect(store: &SnapshotStore) -> Result<(usize, Option<NaiveDateTime>), UpdateError> {
    let conn = match store.connect() {
        Ok(conn) => conn,
        Err(LibraryError::StoreMissing(path)) => {
            return Err(UpdateError::InvalidStore(format!(
                "{} does not exist",
                path.display()
            )));
        }
        Err(LibraryError::StoreUnavailable { source, .. }) => {
            return Err(UpdateError::InvalidStore(source.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let snapshots = SnapshotCatalog::new(&conn, store.table_prefix()).list_all()?;
    if snapshots.is_empty() {
        return Err(UpdateError::InvalidStore(format!(
            "no {}_* snapshot tables",
            store.table_prefix()
        )));
    }

    let latest = snapshots.last().map(|s| s.captured_at);
    Ok((snapshots.len(), latest))
}
