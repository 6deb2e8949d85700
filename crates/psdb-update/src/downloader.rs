//! Store download with retries

use crate::UpdateError;
use futures_util::StreamExt;
use psdb_config::UpdateConfig;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

/// Download progress information
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Total bytes to download, 0 if the server did not say
    pub total: u64,
    /// Bytes downloaded so far
    pub downloaded: u64,
    /// Download speed in bytes per second
    pub speed: u64,
    pub state: DownloadState,
}

impl DownloadProgress {
    /// Get progress as percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.downloaded as f64 / self.total as f64) * 100.0).min(100.0) as u8
        }
    }
}

/// Download state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Downloading,
    Completed,
    Failed,
}

/// Downloads the published store file
pub struct StoreDownloader {
    url: String,
    max_retries: u32,
    client: reqwest::Client,
    progress: Arc<Mutex<Option<DownloadProgress>>>,
}

impl StoreDownloader {
    pub fn new(config: &UpdateConfig) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("psdb/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: config.url.clone(),
            max_retries: config.max_retries.max(1),
            client,
            progress: Arc::new(Mutex::new(None)),
        })
    }

    /// Download into `dest`, replacing any stale file there. Returns the
    /// number of bytes written.
    pub async fn download(&self, dest: &Path) -> Result<u64, UpdateError> {
        tracing::info!("Downloading store from {}", self.url);

        *self.lock_progress() = Some(DownloadProgress {
            total: 0,
            downloaded: 0,
            speed: 0,
            state: DownloadState::Downloading,
        });

        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                tracing::warn!("Retry attempt {} of {}", attempt + 1, self.max_retries);
                tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
            }

            match self.download_once(dest).await {
                Ok(bytes) => {
                    if let Some(p) = self.lock_progress().as_mut() {
                        p.state = DownloadState::Completed;
                        p.downloaded = bytes;
                    }
                    return Ok(bytes);
                }
                Err(e) => {
                    tracing::warn!("Download attempt failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if let Some(p) = self.lock_progress().as_mut() {
            p.state = DownloadState::Failed;
        }

        // Leave nothing half-written behind
        if dest.exists() {
            tokio::fs::remove_file(dest).await?;
        }

        Err(last_error.unwrap_or_else(|| UpdateError::DownloadFailed("Unknown error".into())))
    }

    async fn download_once(&self, dest: &Path) -> Result<u64, UpdateError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(UpdateError::DownloadFailed(format!(
                "Server returned {}",
                response.status()
            )));
        }

        if let Some(p) = self.lock_progress().as_mut() {
            p.total = response.content_length().unwrap_or(0);
            p.downloaded = 0;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let mut last_update = Instant::now();
        let mut bytes_since_update = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| UpdateError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;

            downloaded += chunk.len() as u64;
            bytes_since_update += chunk.len() as u64;

            // Update progress every 100ms
            let elapsed = last_update.elapsed();
            if elapsed.as_millis() >= 100 {
                let speed = (bytes_since_update as f64 / elapsed.as_secs_f64()) as u64;
                if let Some(p) = self.lock_progress().as_mut() {
                    p.downloaded = downloaded;
                    p.speed = speed;
                }
                last_update = Instant::now();
                bytes_since_update = 0;
            }
        }

        file.sync_all().await?;
        Ok(downloaded)
    }

    /// Get current progress
    pub fn progress(&self) -> Option<DownloadProgress> {
        self.lock_progress().clone()
    }

    fn lock_progress(&self) -> MutexGuard<'_, Option<DownloadProgress>> {
        // Progress is plain data; a panicked writer leaves it usable
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }
}
