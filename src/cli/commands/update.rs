//! Update command implementation.

use crate::core::rollback::RollbackManager;
use crate::core::updater::{UpdateOutcome, Updater};
use crate::models::config::Config;
use crate::{sources, Result};
use colored::Colorize;
use std::sync::Arc;

/// Run a full batch, or a single named entry.
pub async fn update(config: Arc<Config>, name: Option<String>) -> Result<()> {
    let client = sources::build_client()?;
    let rollback = Arc::new(RollbackManager::new(config.clone())?);

    // Queued restores from a previous run come first, so a broken jar is
    // not replaced while its restore is still owed.
    let replay = rollback.replay_pending().await?;
    for plugin in &replay.restored {
        println!("{} restored pending rollback of {}", "[ROLLBACK]".cyan(), plugin);
    }

    let updater = Updater::new(client, config, rollback);

    match name {
        Some(name) => {
            let report = updater.update_one(&name).await?;
            println!("{}", report.line());
        }
        None => {
            println!("{}", "[UPDATE] Running update batch...".bold().cyan());
            let reports = match updater.update_all().await {
                Ok(reports) => reports,
                Err(crate::Error::UpdateInProgress) => {
                    println!("{}", "An update batch is already running".yellow());
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            let updated = reports
                .iter()
                .filter(|r| matches!(r.outcome, UpdateOutcome::Updated(_)))
                .count();
            println!();
            println!(
                "{} {} of {} entries updated",
                "[DONE]".bold().green(),
                updated,
                reports.len()
            );
        }
    }

    Ok(())
}
