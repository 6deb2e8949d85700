//! Integration tests for swapping snapshot stores

use psdb_library::{PriceTracker, SnapshotStore};
use psdb_update::{StoreInstaller, UpdateError, partial_path};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct InstallEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    target: PathBuf,
}

impl InstallEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path().join("psdb").join("playstation_games.db");
        Self { temp_dir, target }
    }

    fn staged(&self) -> PathBuf {
        partial_path(&self.target)
    }
}

fn write_store(path: &Path, tables: &[&str]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let conn = Connection::open(path).unwrap();
    for table in tables {
        conn.execute_batch(&format!(
            "CREATE TABLE \"{table}\" (concept_id TEXT, name TEXT, surum_adi_1 TEXT, fiyat_1 TEXT);
             INSERT INTO \"{table}\" VALUES ('1', 'Astro Bot', 'Standart', '1.749,00');"
        ))
        .unwrap();
    }
}

#[tokio::test]
async fn test_install_fresh_store() {
    let env = InstallEnv::new();
    let staged = env.staged();
    write_store(&staged, &["games_01_03_2025_09_00", "games_02_03_2025_21_15"]);

    let result = StoreInstaller::new("games")
        .install(&staged, &env.target)
        .await
        .unwrap();

    assert_eq!(result.snapshots, 2);
    assert!(result.bytes > 0);
    assert_eq!(
        result.latest.map(|t| t.format("%d_%m_%Y_%H_%M").to_string()),
        Some("02_03_2025_21_15".to_string())
    );
    assert!(env.target.exists());
    assert!(!staged.exists());
}

#[tokio::test]
async fn test_install_replaces_existing_store() {
    let env = InstallEnv::new();
    write_store(&env.target, &["games_01_03_2025_09_00"]);

    let tracker = PriceTracker::new(SnapshotStore::new(&env.target));
    assert_eq!(tracker.snapshots().await.unwrap().len(), 1);

    let staged = env.staged();
    write_store(
        &staged,
        &["games_01_03_2025_09_00", "games_02_03_2025_09_00", "games_03_03_2025_09_00"],
    );
    StoreInstaller::new("games")
        .install(&staged, &env.target)
        .await
        .unwrap();

    assert_eq!(tracker.snapshots().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_rejects_garbage_and_keeps_old_store() {
    let env = InstallEnv::new();
    write_store(&env.target, &["games_01_03_2025_09_00"]);

    let staged = env.staged();
    std::fs::write(&staged, b"<html>404 Not Found</html>").unwrap();

    let result = StoreInstaller::new("games").install(&staged, &env.target).await;
    assert!(matches!(result, Err(UpdateError::InvalidStore(_))));
    assert!(!staged.exists());
    assert_eq!(
        SnapshotStore::new(&env.target).snapshot_count().unwrap(),
        1
    );
}

#[tokio::test]
async fn test_rejects_store_without_snapshots() {
    let env = InstallEnv::new();
    let staged = env.staged();
    write_store(&staged, &["unrelated"]);

    let result = StoreInstaller::new("games").install(&staged, &env.target).await;
    assert!(matches!(result, Err(UpdateError::InvalidStore(_))));
    assert!(!env.target.exists());
}

#[tokio::test]
async fn test_missing_staged_file() {
    let env = InstallEnv::new();
    let result = StoreInstaller::new("games")
        .install(&env.staged(), &env.target)
        .await;
    assert!(matches!(result, Err(UpdateError::InvalidStore(_))));
}
