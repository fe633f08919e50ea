//! Rollback management.
//!
//! Snapshots the previous jar before an install, watches host log lines for
//! failure signatures afterward, and restores the snapshot when one fires.
//! A restore that cannot complete (destination locked by the host process)
//! is queued durably and replayed later.
//!
//! One manager instance owns all state; nothing here is global, so tests
//! get clean isolation from a fresh instance.

use crate::models::backup::{normalize_key, BackupRecord, PendingTask};
use crate::models::config::Config;
use crate::utils::fs::copy_file;
use crate::Result;
use chrono::Utc;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex as TokioMutex};

/// Failure signatures used when none are configured.
const DEFAULT_FAILURE_PATTERNS: &[&str] = &[
    r"Unsupported API version",
    r"Could not load plugin",
    r"Could not load '",
    r"Error occurred while enabling",
];

/// Heuristics that pull plugin-name candidates out of a matched log line,
/// in the order they are tried.
const CANDIDATE_PATTERNS: &[&str] = &[
    r#""([^"]+)""#,
    r"[Ee]nabling ([A-Za-z0-9_\- ]+)",
    r"[Dd]isabling ([A-Za-z0-9_\- ]+)",
    r"\[([A-Za-z0-9_\-]+)\]",
];

/// Outcome of one restore attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The snapshot was copied back.
    Restored,
    /// Another signal already triggered this record's restore.
    AlreadyTriggered,
    /// Every copy failed; the task is in the durable pending queue.
    Queued,
}

/// Result of replaying the pending queue.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub restored: Vec<String>,
    pub still_pending: Vec<String>,
    /// True when the queue was purged because rollback is disabled.
    pub purged: bool,
}

/// Process-scoped rollback state: snapshot store, signal matching, restore
/// engine and pending queue.
pub struct RollbackManager {
    config: Arc<Config>,
    signatures: Vec<Regex>,
    candidates: Vec<Regex>,
    by_plugin: StdMutex<HashMap<String, Arc<BackupRecord>>>,
    by_jar: StdMutex<HashMap<String, Arc<BackupRecord>>>,
    /// Coarse lock around pending-file read-modify-write cycles.
    pending_lock: TokioMutex<()>,
}

impl RollbackManager {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let patterns: Vec<&str> = if config.rollback.failure_patterns.is_empty() {
            DEFAULT_FAILURE_PATTERNS.to_vec()
        } else {
            config
                .rollback
                .failure_patterns
                .iter()
                .map(String::as_str)
                .collect()
        };

        let signatures = compile_all(&patterns)?;
        let candidates = compile_all(CANDIDATE_PATTERNS)?;

        Ok(Self {
            config,
            signatures,
            candidates,
            by_plugin: StdMutex::new(HashMap::new()),
            by_jar: StdMutex::new(HashMap::new()),
            pending_lock: TokioMutex::new(()),
        })
    }

    pub fn enabled(&self) -> bool {
        self.config.rollback.enabled
    }

    fn pending_file(&self) -> PathBuf {
        self.config.rollback.root.join("pending_rollbacks.json")
    }

    /// Snapshot the artifact currently installed for `target_path`.
    ///
    /// Returns `None` when no prior artifact exists (first install, nothing
    /// to restore later). The snapshot lands in a per-plugin directory with
    /// a timestamp-suffixed name, and older snapshots beyond the retention
    /// count are trimmed.
    pub fn snapshot(
        &self,
        plugin_name: &str,
        target_path: &Path,
    ) -> Result<Option<Arc<BackupRecord>>> {
        let active_path = self.resolve_active_path(target_path);
        let source = if active_path.is_file() {
            active_path.clone()
        } else if target_path.is_file() {
            target_path.to_path_buf()
        } else {
            tracing::debug!("no prior artifact for {}, skipping snapshot", plugin_name);
            return Ok(None);
        };

        let jar_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.jar", plugin_name));
        let plugin_key = normalize_key(plugin_name);

        let backup_dir = self.config.rollback.root.join(&plugin_key);
        let stem = jar_name.strip_suffix(".jar").unwrap_or(&jar_name);
        let backup_path = backup_dir.join(format!(
            "{}-{}.jar",
            stem,
            Utc::now().format("%Y%m%d%H%M%S")
        ));
        copy_file(&source, &backup_path)?;
        trim_snapshots(&backup_dir, self.config.rollback.max_snapshots);

        let record = Arc::new(BackupRecord::new(
            plugin_name,
            &jar_name,
            active_path,
            target_path.to_path_buf(),
            backup_path,
        ));

        self.by_plugin
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.plugin_key.clone(), record.clone());
        self.by_jar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.jar_key.clone(), record.clone());

        tracing::info!(
            "snapshotted {} -> {}",
            plugin_name,
            record.backup_path.display()
        );
        Ok(Some(record))
    }

    /// When the target sits in the update-staging directory, the running
    /// artifact is the same file name under the plugins directory.
    fn resolve_active_path(&self, target_path: &Path) -> PathBuf {
        let update_dir = self.config.update_dir();
        if target_path.starts_with(&update_dir) {
            if let Some(name) = target_path.file_name() {
                let active = self.config.plugins_dir.join(name);
                if active.is_file() {
                    return active;
                }
            }
        }
        target_path.to_path_buf()
    }

    /// Record that the new artifact was placed, for later staged-file
    /// cleanup on restore.
    pub fn confirm_installed(&self, record: &BackupRecord, new_jar_path: &Path) {
        *record
            .new_jar_path
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(new_jar_path.to_path_buf());
    }

    /// Look up a record by either key.
    pub fn find_record(&self, name: &str) -> Option<Arc<BackupRecord>> {
        let key = normalize_key(name);
        if let Some(record) = self
            .by_plugin
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Some(record.clone());
        }
        self.by_jar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
    }

    /// Match one host log line against the failure signatures and trigger a
    /// restore when a known plugin can be extracted from it.
    pub async fn handle_log_line(&self, line: &str) {
        if !self.enabled() {
            return;
        }
        if !self.signatures.iter().any(|re| re.is_match(line)) {
            return;
        }

        tracing::warn!("failure signature matched: {}", line.trim());

        for candidate in self.extract_candidates(line) {
            if let Some(record) = self.find_record(&candidate) {
                match self.restore(&record).await {
                    Ok(outcome) => {
                        tracing::info!("restore of {}: {:?}", record.plugin_key, outcome)
                    }
                    Err(err) => tracing::error!("restore of {}: {}", record.plugin_key, err),
                }
                return;
            }
        }
        tracing::debug!("no backup record matches line: {}", line.trim());
    }

    /// Identifier candidates from a log line, in heuristic order.
    fn extract_candidates(&self, line: &str) -> Vec<String> {
        let mut out = Vec::new();
        for re in &self.candidates {
            for caps in re.captures_iter(line) {
                if let Some(m) = caps.get(1) {
                    let candidate = m.as_str().trim().to_string();
                    if !candidate.is_empty() && !out.contains(&candidate) {
                        out.push(candidate);
                    }
                }
            }
        }
        out
    }

    /// Restore the snapshot over the installed artifact.
    ///
    /// Guarded by the record's one-shot flag: concurrent signals for the
    /// same record result in exactly one restore. When every copy attempt
    /// fails the task goes to the durable pending queue instead of being
    /// dropped.
    pub async fn restore(&self, record: &BackupRecord) -> Result<RestoreOutcome> {
        if record
            .rollback_triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(RestoreOutcome::AlreadyTriggered);
        }

        self.archive_failing_jar(record);

        let mut destinations = vec![record.active_path.clone()];
        if record.target_path != record.active_path {
            destinations.push(record.target_path.clone());
        }

        let mut copied = 0usize;
        for dest in &destinations {
            match copy_file(&record.backup_path, dest) {
                Ok(_) => copied += 1,
                Err(err) => {
                    tracing::warn!("restore copy to {} failed: {}", dest.display(), err)
                }
            }
        }

        if copied == 0 {
            let task = PendingTask::from_record(record);
            self.enqueue_pending(task).await?;
            return Ok(RestoreOutcome::Queued);
        }

        // A staged copy of the failed artifact elsewhere would reinstall it
        // on the next restart.
        let staged = record
            .new_jar_path
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(staged) = staged {
            if !destinations.contains(&staged) && staged.is_file() {
                if let Err(err) = std::fs::remove_file(&staged) {
                    tracing::warn!("could not remove staged jar {}: {}", staged.display(), err);
                }
            }
        }

        tracing::info!(
            "restored {} from {}; restart the server to finish",
            record.plugin_key,
            record.backup_path.display()
        );
        Ok(RestoreOutcome::Restored)
    }

    /// Keep the failing binary for forensics. Best-effort: failures here
    /// never block the restore.
    fn archive_failing_jar(&self, record: &BackupRecord) {
        let source = if record.target_path.is_file() {
            &record.target_path
        } else if record.active_path.is_file() {
            &record.active_path
        } else {
            return;
        };

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown.jar".to_string());
        let stem = name.strip_suffix(".jar").unwrap_or(&name);
        let archived = self
            .config
            .rollback
            .root
            .join(&record.plugin_key)
            .join("failed")
            .join(format!("{}-{}.jar", stem, Utc::now().format("%Y%m%d%H%M%S")));

        if let Err(err) = copy_file(source, &archived) {
            tracing::debug!("failure archive skipped: {}", err);
        }
    }

    async fn enqueue_pending(&self, task: PendingTask) -> Result<()> {
        let _guard = self.pending_lock.lock().await;
        let mut tasks = load_pending(&self.pending_file())?;
        if !tasks.iter().any(|t| t.same_keys(&task)) {
            tasks.push(task);
        }
        save_pending(&self.pending_file(), &tasks)
    }

    /// Replay the pending queue: successful restores are removed, failures
    /// stay in the file. When rollback is administratively disabled the
    /// queue is purged instead of acted upon.
    pub async fn replay_pending(&self) -> Result<ReplayReport> {
        let _guard = self.pending_lock.lock().await;
        let file = self.pending_file();

        if !self.enabled() {
            if file.exists() {
                std::fs::remove_file(&file)?;
            }
            return Ok(ReplayReport {
                purged: true,
                ..ReplayReport::default()
            });
        }

        let tasks = load_pending(&file)?;
        let mut report = ReplayReport::default();
        let mut remaining = Vec::new();

        for task in tasks {
            if replay_task(&task) {
                report.restored.push(task.plugin_key.clone());
            } else {
                report.still_pending.push(task.plugin_key.clone());
                remaining.push(task);
            }
        }

        save_pending(&file, &remaining)?;
        Ok(report)
    }

    /// Drop every queued task.
    pub async fn purge_pending(&self) -> Result<()> {
        let _guard = self.pending_lock.lock().await;
        let file = self.pending_file();
        if file.exists() {
            std::fs::remove_file(&file)?;
        }
        Ok(())
    }

    /// Number of tasks currently queued.
    pub async fn pending_count(&self) -> Result<usize> {
        let _guard = self.pending_lock.lock().await;
        Ok(load_pending(&self.pending_file())?.len())
    }

    /// Single-consumer signal queue: log lines from any worker funnel into
    /// one task so concurrent producers cannot race on the same record.
    pub fn spawn_signal_consumer(self: &Arc<Self>) -> mpsc::UnboundedSender<String> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let manager = self.clone();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                manager.handle_log_line(&line).await;
            }
        });
        tx
    }
}

/// One pending-task replay attempt: copy the backup over the active path,
/// and the target path when distinct.
fn replay_task(task: &PendingTask) -> bool {
    let backup = Path::new(&task.backup_path);
    let active = Path::new(&task.active_path);
    let target = Path::new(&task.target_path);

    let mut destinations = vec![active];
    if target != active {
        destinations.push(target);
    }

    let mut copied = 0usize;
    for dest in destinations {
        match copy_file(backup, dest) {
            Ok(_) => copied += 1,
            Err(err) => tracing::warn!("pending replay copy to {} failed: {}", dest.display(), err),
        }
    }
    copied > 0
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| crate::Error::other(format!("bad pattern {}: {}", p, e))))
        .collect()
}

/// Remove snapshots beyond the retention count, oldest first. Timestamped
/// names make reverse lexicographic order newest-first.
fn trim_snapshots(backup_dir: &Path, max_snapshots: usize) {
    let Ok(entries) = std::fs::read_dir(backup_dir) else {
        return;
    };
    let mut names: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.path().is_file())
        .map(|e| e.path())
        .collect();
    names.sort_by(|a, b| b.cmp(a));

    for old in names.into_iter().skip(max_snapshots.max(1)) {
        if let Err(err) = std::fs::remove_file(&old) {
            tracing::debug!("snapshot trim of {} failed: {}", old.display(), err);
        }
    }
}

fn load_pending(path: &Path) -> Result<Vec<PendingTask>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tasks = serde_json::from_str(&content)?;
    Ok(tasks)
}

fn save_pending(path: &Path, tasks: &[PendingTask]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(tasks)?;
    std::fs::write(path, json)?;
    Ok(())
}
