//! Watch command: feed host log lines into the rollback signal monitor.

use crate::core::rollback::RollbackManager;
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

/// Follow a log file (or stdin) and hand every line to the signal monitor.
/// Runs until interrupted.
pub async fn watch(config: Arc<Config>, log_file: Option<&Path>) -> Result<()> {
    let manager = Arc::new(RollbackManager::new(config)?);
    if !manager.enabled() {
        println!("{}", "Rollback is disabled; watching does nothing".yellow());
        return Ok(());
    }

    let sender = manager.spawn_signal_consumer();

    match log_file {
        Some(path) => {
            println!("Watching {} for failure signatures...", path.display());
            follow_file(path, &sender).await
        }
        None => {
            println!("Reading log lines from stdin...");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let _ = sender.send(line);
            }
            // Give the consumer a beat to drain before exiting.
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }
    }
}

/// Tail the file from its current end, polling for appended lines.
async fn follow_file(
    path: &Path,
    sender: &tokio::sync::mpsc::UnboundedSender<String>,
) -> Result<()> {
    let file = tokio::fs::File::open(path).await?;
    let mut reader = BufReader::new(file);
    reader.seek(std::io::SeekFrom::End(0)).await?;

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            tokio::time::sleep(Duration::from_millis(500)).await;
            continue;
        }
        let _ = sender.send(line.trim_end().to_string());
    }
}
