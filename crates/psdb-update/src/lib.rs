//! Snapshot database refresh for psdb
//!
//! Fetches a freshly published database file and swaps it in for the local
//! store. The swap is a rename within the store's directory, so readers see
//! either the old file or the new one, never a mix.
//!
//! # Flow
//!
//! - Stream the remote file into `<store>.partial`, retrying with backoff
//! - Check the staged file is a SQLite store holding snapshot tables
//! - Rename it over the store

mod downloader;
mod installer;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use downloader::{DownloadProgress, DownloadState, StoreDownloader};
pub use installer::{InstallResult, StoreInstaller};

use psdb_config::UpdateConfig;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Downloaded store rejected: {0}")]
    InvalidStore(String),

    #[error("Installation failed: {0}")]
    InstallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Library(#[from] psdb_library::LibraryError),
}

/// Staging path used while a new store is downloaded
pub fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store.db".into());
    name.push(".partial");
    target.with_file_name(name)
}

/// Downloads and installs fresh snapshot databases
pub struct StoreUpdater {
    downloader: StoreDownloader,
    installer: StoreInstaller,
}

impl StoreUpdater {
    /// Create an updater for stores using `table_prefix`
    pub fn new(config: &UpdateConfig, table_prefix: &str) -> Result<Self, UpdateError> {
        Ok(Self {
            downloader: StoreDownloader::new(config)?,
            installer: StoreInstaller::new(table_prefix),
        })
    }

    /// Download the published store and install it at `target`
    pub async fn refresh(&self, target: &Path) -> Result<InstallResult, UpdateError> {
        let staged = partial_path(target);
        let bytes = self.downloader.download(&staged).await?;
        tracing::info!("Store downloaded ({} bytes)", bytes);

        let result = self.installer.install(&staged, target).await?;
        tracing::info!(
            "Store installed at {} ({} snapshots)",
            target.display(),
            result.snapshots
        );
        Ok(result)
    }

    pub fn download_progress(&self) -> Option<DownloadProgress> {
        self.downloader.progress()
    }
}
