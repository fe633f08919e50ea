//! Pending-rollback queue commands.

use crate::cli::args::PendingAction;
use crate::core::rollback::RollbackManager;
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;
use std::sync::Arc;

pub async fn pending(config: Arc<Config>, action: PendingAction) -> Result<()> {
    let manager = RollbackManager::new(config)?;

    match action {
        PendingAction::Replay => {
            let report = manager.replay_pending().await?;
            if report.purged {
                println!(
                    "{}",
                    "Rollback is disabled; pending queue purged".yellow()
                );
                return Ok(());
            }
            for plugin in &report.restored {
                println!("{} restored {}", "[OK]".green(), plugin);
            }
            for plugin in &report.still_pending {
                println!("{} {} still pending", "[WAIT]".yellow(), plugin);
            }
            if report.restored.is_empty() && report.still_pending.is_empty() {
                println!("Pending queue is empty");
            } else if report.still_pending.is_empty() {
                println!();
                println!(
                    "{}",
                    "All pending restores completed; restart the server to finish".bold()
                );
            }
        }
        PendingAction::Purge => {
            manager.purge_pending().await?;
            println!("{} pending queue purged", "[OK]".green());
        }
        PendingAction::Show => {
            let count = manager.pending_count().await?;
            println!("{} restore(s) pending", count);
        }
    }

    Ok(())
}
