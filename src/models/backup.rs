//! Backup data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

/// Normalize a plugin or jar name into a lookup key.
///
/// Keys are extension-stripped, lowercase, with spaces replaced by
/// underscores, so "My Plugin.jar" and "my_plugin" resolve to the same
/// record.
pub fn normalize_key(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_suffix(".jar").unwrap_or(name);
    name.to_lowercase().replace(' ', "_")
}

/// An in-memory record of one snapshotted artifact.
///
/// Lives for the duration of the run and is looked up by either key while
/// log signals are monitored.
#[derive(Debug)]
pub struct BackupRecord {
    /// Normalized plugin-name key.
    pub plugin_key: String,
    /// Normalized jar-file-name key.
    pub jar_key: String,
    /// Location of the currently running artifact.
    pub active_path: PathBuf,
    /// Where the new artifact lands. Differs from `active_path` when the
    /// update-staging convention is in use.
    pub target_path: PathBuf,
    /// Snapshot location.
    pub backup_path: PathBuf,
    /// Snapshot creation time.
    pub created_at: DateTime<Utc>,
    /// Set once the new artifact is confirmed placed.
    pub new_jar_path: Mutex<Option<PathBuf>>,
    /// One-shot flag: the false→true transition is monotonic so at most one
    /// restore executes per record.
    pub rollback_triggered: AtomicBool,
}

impl BackupRecord {
    pub fn new(
        plugin_name: &str,
        jar_name: &str,
        active_path: PathBuf,
        target_path: PathBuf,
        backup_path: PathBuf,
    ) -> Self {
        Self {
            plugin_key: normalize_key(plugin_name),
            jar_key: normalize_key(jar_name),
            active_path,
            target_path,
            backup_path,
            created_at: Utc::now(),
            new_jar_path: Mutex::new(None),
            rollback_triggered: AtomicBool::new(false),
        }
    }
}

/// The durable projection of a [`BackupRecord`], queued when an immediate
/// restore cannot complete. Survives process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTask {
    pub plugin_key: String,
    pub jar_key: String,
    pub active_path: String,
    pub target_path: String,
    pub backup_path: String,
}

impl PendingTask {
    /// Project a record into its serializable form.
    pub fn from_record(record: &BackupRecord) -> Self {
        Self {
            plugin_key: record.plugin_key.clone(),
            jar_key: record.jar_key.clone(),
            active_path: record.active_path.display().to_string(),
            target_path: record.target_path.display().to_string(),
            backup_path: record.backup_path.display().to_string(),
        }
    }

    /// Queue identity: two tasks for the same key pair are duplicates.
    pub fn same_keys(&self, other: &Self) -> bool {
        self.plugin_key == other.plugin_key && self.jar_key == other.jar_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("My Plugin.jar"), "my_plugin");
        assert_eq!(normalize_key("EssentialsX"), "essentialsx");
        assert_eq!(normalize_key("  Foo Bar  "), "foo_bar");
    }

    #[test]
    fn test_pending_task_dedup_keys() {
        let record = BackupRecord::new(
            "Foo",
            "foo-1.0.jar",
            PathBuf::from("plugins/foo.jar"),
            PathBuf::from("plugins/update/foo.jar"),
            PathBuf::from("backup/foo.jar"),
        );
        let a = PendingTask::from_record(&record);
        let mut b = a.clone();
        b.backup_path = "elsewhere".to_string();
        assert!(a.same_keys(&b));
    }
}
