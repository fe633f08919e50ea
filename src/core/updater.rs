//! Update orchestration.
//!
//! Drives one entry from locator to installed jar: classify, resolve,
//! snapshot, fetch (or build from source), confirm. A batch run walks the
//! whole list under a single-flight guard; per-entry failures never abort
//! the batch.

use crate::core::builder::SourceBuilder;
use crate::core::fetcher::{decide_destination, Fetcher};
use crate::core::rollback::RollbackManager;
use crate::models::config::Config;
use crate::models::list::PluginList;
use crate::models::locator::{Locator, SourceKind};
use crate::sources::SourceResolver;
use crate::Result;
use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How many entries of a batch download at once.
const BATCH_CONCURRENCY: usize = 4;

/// Terminal outcome for one entry, reported as a single line.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(PathBuf),
    NotFound,
    Failed(String),
}

/// One entry's report within a batch.
#[derive(Debug)]
pub struct EntryReport {
    pub name: String,
    pub outcome: UpdateOutcome,
}

impl EntryReport {
    /// The single human-readable line for this entry.
    pub fn line(&self) -> String {
        match &self.outcome {
            UpdateOutcome::Updated(path) => {
                format!("{} {} -> {}", "[OK]".green(), self.name, path.display())
            }
            UpdateOutcome::NotFound => {
                format!("{} {}: no artifact found", "[MISS]".yellow(), self.name)
            }
            UpdateOutcome::Failed(reason) => {
                format!("{} {}: {}", "[FAIL]".red(), self.name, reason)
            }
        }
    }
}

/// Resolves and installs plugins from the list file.
pub struct Updater {
    config: Arc<Config>,
    resolver: SourceResolver,
    fetcher: Fetcher,
    builder: SourceBuilder,
    rollback: Arc<RollbackManager>,
    /// Single-flight guard: only one batch runs process-wide.
    updating: AtomicBool,
}

impl Updater {
    pub fn new(
        client: reqwest::Client,
        config: Arc<Config>,
        rollback: Arc<RollbackManager>,
    ) -> Self {
        Self {
            resolver: SourceResolver::new(client.clone(), config.clone()),
            fetcher: Fetcher::new(client.clone(), config.clone()),
            builder: SourceBuilder::new(client, config.clone()),
            config,
            rollback,
            updating: AtomicBool::new(false),
        }
    }

    /// Run a full batch over every enabled list entry.
    ///
    /// Rejected with [`crate::Error::UpdateInProgress`] when another batch
    /// is already running; callers surface that as a notice, not a crash.
    pub async fn update_all(&self) -> Result<Vec<EntryReport>> {
        if self
            .updating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(crate::Error::UpdateInProgress);
        }
        let _guard = BatchGuard(&self.updating);

        let list = PluginList::load(&self.config.list_file)?;
        let entries: Vec<(String, String)> = list
            .enabled_entries()
            .into_iter()
            .map(|e| (e.name.clone(), e.locator.clone()))
            .collect();

        tracing::info!("starting batch over {} entries", entries.len());

        let pb = ProgressBar::new(entries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let reports: Vec<EntryReport> = stream::iter(entries)
            .map(|(name, locator)| {
                let pb = pb.clone();
                async move {
                    pb.set_message(name.clone());
                    let outcome = self.update_entry(&name, &locator).await;
                    let report = EntryReport { name, outcome };
                    pb.println(report.line());
                    pb.inc(1);
                    report
                }
            })
            .buffer_unordered(BATCH_CONCURRENCY)
            .collect()
            .await;

        pb.finish_and_clear();
        Ok(reports)
    }

    /// Update a single named entry from the list file, outside the batch
    /// guard.
    pub async fn update_one(&self, name: &str) -> Result<EntryReport> {
        let list = PluginList::load(&self.config.list_file)?;
        let entry = list
            .get(name)
            .ok_or_else(|| crate::Error::EntryNotFound(name.to_string()))?;

        let outcome = self.update_entry(&entry.name, &entry.locator).await;
        Ok(EntryReport {
            name: entry.name.clone(),
            outcome,
        })
    }

    /// Spawn an independent fire-and-forget update task. Not subject to the
    /// single-flight guard; several may run concurrently.
    pub fn spawn_update_one(
        self: &Arc<Self>,
        name: String,
    ) -> tokio::task::JoinHandle<Result<EntryReport>> {
        let updater = self.clone();
        tokio::spawn(async move { updater.update_one(&name).await })
    }

    /// Process one identifier end to end. Errors are folded into the
    /// outcome; nothing escapes to abort sibling entries.
    async fn update_entry(&self, name: &str, locator_str: &str) -> UpdateOutcome {
        let locator = match Locator::parse(locator_str) {
            Ok(locator) => locator,
            Err(err) => return UpdateOutcome::Failed(err.to_string()),
        };
        tracing::info!("{}: {:?} locator {}", name, locator.kind, locator.url);

        let candidate = match self.resolver.resolve(&locator).await {
            Ok(Some(candidate)) => Some(candidate),
            Ok(None) => None,
            Err(err) => return UpdateOutcome::Failed(err.to_string()),
        };

        let dest = decide_destination(&self.config, name);
        let record = match self.rollback.snapshot(name, &dest) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("{}: snapshot failed: {}", name, err);
                None
            }
        };

        let installed = match candidate {
            Some(candidate) => self
                .fetcher
                .download_to(&candidate, name, &dest)
                .await
                .map(|_| Some(dest.clone())),
            // Only the GitHub release path defers to the source build.
            None if locator.kind == SourceKind::GitHubRelease => {
                self.builder.run(&locator, &dest).await
            }
            None => return UpdateOutcome::NotFound,
        };

        match installed {
            Ok(Some(path)) => {
                if let Some(record) = &record {
                    self.rollback.confirm_installed(record, &path);
                }
                UpdateOutcome::Updated(path)
            }
            Ok(None) => UpdateOutcome::NotFound,
            Err(err) => UpdateOutcome::Failed(err.to_string()),
        }
    }
}

/// Clears the updating flag however the batch ends.
struct BatchGuard<'a>(&'a AtomicBool);

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_guard_clears_flag() {
        let flag = AtomicBool::new(true);
        {
            let _guard = BatchGuard(&flag);
        }
        assert!(!flag.load(Ordering::SeqCst));
    }
}
