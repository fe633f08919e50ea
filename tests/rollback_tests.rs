//! Integration tests for the rollback manager.
//!
//! Tests cover:
//! - Snapshot and signal-triggered restore
//! - Forensic archive of the failing jar
//! - Single-fire guarantee under concurrent signals
//! - Pending-queue durability and replay
//! - Queue purge when rollback is disabled
//! - Snapshot retention trimming

use plugin_updater::core::rollback::{RestoreOutcome, RollbackManager};
use plugin_updater::models::config::Config;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn test_config(root: &Path, enabled: bool) -> Arc<Config> {
    let mut config = Config::default();
    config.plugins_dir = root.join("plugins");
    config.rollback.root = root.join("rollback");
    config.rollback.enabled = enabled;
    config.rollback.max_snapshots = 2;
    Arc::new(config)
}

fn install_jar(config: &Config, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    fs::create_dir_all(&config.plugins_dir).unwrap();
    let path = config.plugins_dir.join(format!("{}.jar", name));
    fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn test_signal_triggers_restore() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let jar = install_jar(&config, "Foo", b"good version");
    manager.snapshot("Foo", &jar).unwrap().unwrap();

    // The "update" replaces the jar with a broken build.
    fs::write(&jar, b"broken version").unwrap();

    manager
        .handle_log_line(r#"[Server] Could not load plugin "Foo""#)
        .await;

    assert_eq!(fs::read(&jar).unwrap(), b"good version");
}

#[tokio::test]
async fn test_restore_archives_failing_jar() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let jar = install_jar(&config, "Foo", b"good version");
    let record = manager.snapshot("Foo", &jar).unwrap().unwrap();
    fs::write(&jar, b"broken version").unwrap();

    manager.restore(&record).await.unwrap();

    // The broken binary is kept for inspection under failed/.
    let failed_dir = config.rollback.root.join("foo").join("failed");
    let archived: Vec<_> = fs::read_dir(&failed_dir).unwrap().flatten().collect();
    assert_eq!(archived.len(), 1);
    let name = archived[0].file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("Foo-") && name.ends_with(".jar"), "{}", name);
    assert_eq!(fs::read(archived[0].path()).unwrap(), b"broken version");
    assert_eq!(fs::read(&jar).unwrap(), b"good version");
}

#[tokio::test]
async fn test_unmatched_lines_do_nothing() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let jar = install_jar(&config, "Foo", b"good version");
    manager.snapshot("Foo", &jar).unwrap().unwrap();
    fs::write(&jar, b"new version").unwrap();

    manager
        .handle_log_line("[Server] Done (3.2s)! For help, type \"help\"")
        .await;

    assert_eq!(fs::read(&jar).unwrap(), b"new version");
}

#[tokio::test]
async fn test_concurrent_signals_restore_exactly_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let jar = install_jar(&config, "Foo", b"good version");
    let record = manager.snapshot("Foo", &jar).unwrap().unwrap();
    fs::write(&jar, b"broken version").unwrap();

    let (a, b) = tokio::join!(manager.restore(&record), manager.restore(&record));
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == RestoreOutcome::Restored)
            .count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == RestoreOutcome::AlreadyTriggered)
            .count(),
        1
    );
    assert_eq!(fs::read(&jar).unwrap(), b"good version");
}

#[tokio::test]
async fn test_locked_destination_queues_pending_task() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let jar = install_jar(&config, "Foo", b"good version");
    let record = manager.snapshot("Foo", &jar).unwrap().unwrap();

    // Simulate an unwritable destination: a directory now occupies the
    // jar's path, so every copy attempt fails.
    fs::remove_file(&jar).unwrap();
    fs::create_dir(&jar).unwrap();

    let outcome = manager.restore(&record).await.unwrap();
    assert_eq!(outcome, RestoreOutcome::Queued);
    assert_eq!(manager.pending_count().await.unwrap(), 1);

    // Replaying while still blocked keeps the task queued.
    let report = manager.replay_pending().await.unwrap();
    assert_eq!(report.still_pending.len(), 1);
    assert_eq!(manager.pending_count().await.unwrap(), 1);

    // Once the destination frees up, replay succeeds and drains the queue.
    fs::remove_dir(&jar).unwrap();
    let report = manager.replay_pending().await.unwrap();
    assert_eq!(report.restored, vec!["foo".to_string()]);
    assert_eq!(manager.pending_count().await.unwrap(), 0);
    assert_eq!(fs::read(&jar).unwrap(), b"good version");
}

#[tokio::test]
async fn test_disabled_rollback_purges_queue() {
    let dir = TempDir::new().unwrap();

    // Queue a task while rollback is on.
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();
    let jar = install_jar(&config, "Foo", b"good version");
    let record = manager.snapshot("Foo", &jar).unwrap().unwrap();
    fs::remove_file(&jar).unwrap();
    fs::create_dir(&jar).unwrap();
    assert_eq!(
        manager.restore(&record).await.unwrap(),
        RestoreOutcome::Queued
    );

    // A manager with rollback disabled purges instead of replaying.
    let disabled = RollbackManager::new(test_config(dir.path(), false)).unwrap();
    let report = disabled.replay_pending().await.unwrap();
    assert!(report.purged);
    assert_eq!(disabled.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_snapshot_retention_trims_oldest() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let jar = install_jar(&config, "Foo", b"v1");
    for content in [b"v2", b"v3", b"v4"] {
        manager.snapshot("Foo", &jar).unwrap().unwrap();
        fs::write(&jar, content).unwrap();
        // Timestamp suffixes have second granularity.
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    }

    let backup_dir = config.rollback.root.join("foo");
    let snapshots = fs::read_dir(&backup_dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().is_file())
        .count();
    assert!(snapshots <= 2, "retention should keep at most 2, got {}", snapshots);
}

#[tokio::test]
async fn test_first_install_has_nothing_to_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), true);
    let manager = RollbackManager::new(config.clone()).unwrap();

    let target = config.plugins_dir.join("Brand-New.jar");
    assert!(manager.snapshot("Brand-New", &target).unwrap().is_none());
}
