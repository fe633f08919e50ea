//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plugin Updater - keep server plugin jars current, roll back when they break
#[derive(Parser, Debug)]
#[command(name = "plugin-updater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update every enabled entry, or a single named one
    Update {
        /// Entry name; omit to run the full batch
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },

    /// Show the plugin list with source kinds
    List,

    /// Add an entry to the plugin list
    Add {
        /// Entry name
        #[arg(value_name = "NAME")]
        name: String,

        /// Source locator (Spigot/GitHub/Jenkins/... URL)
        #[arg(value_name = "LOCATOR")]
        locator: String,
    },

    /// Remove an entry from the plugin list
    Remove {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Re-enable a disabled entry
    Enable {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Disable an entry without removing it
    Disable {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Manage the pending-rollback queue
    Pending {
        #[command(subcommand)]
        action: PendingAction,
    },

    /// Feed host log lines into the rollback signal monitor
    Watch {
        /// Log file to follow; omit to read stdin
        #[arg(value_name = "LOG_FILE")]
        log_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PendingAction {
    /// Retry every queued restore
    Replay,
    /// Drop every queued restore
    Purge,
    /// Show how many restores are queued
    Show,
}
