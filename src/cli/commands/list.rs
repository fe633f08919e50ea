//! Plugin list commands: list, add, remove, enable, disable.

use crate::models::config::Config;
use crate::models::list::PluginList;
use crate::models::locator::classify;
use crate::Result;
use colored::Colorize;

/// Print every entry with its classified source kind.
pub fn list(config: &Config) -> Result<()> {
    let list = PluginList::load(&config.list_file)?;
    let entries = list.entries();

    if entries.is_empty() {
        println!("Plugin list is empty: {}", config.list_file.display());
        return Ok(());
    }

    for entry in entries {
        let kind = classify(&entry.locator);
        let marker = if entry.enabled {
            "[on] ".green()
        } else {
            "[off]".yellow()
        };
        println!("{} {} ({:?}): {}", marker, entry.name.bold(), kind, entry.locator);
    }
    Ok(())
}

pub fn add(config: &Config, name: &str, locator: &str) -> Result<()> {
    let mut list = PluginList::load(&config.list_file)?;
    list.add(name, locator)?;
    println!("{} added {}", "[OK]".green(), name);
    Ok(())
}

pub fn remove(config: &Config, name: &str) -> Result<()> {
    let mut list = PluginList::load(&config.list_file)?;
    list.remove(name)?;
    println!("{} removed {}", "[OK]".green(), name);
    Ok(())
}

pub fn set_enabled(config: &Config, name: &str, enabled: bool) -> Result<()> {
    let mut list = PluginList::load(&config.list_file)?;
    list.set_enabled(name, enabled)?;
    let verb = if enabled { "enabled" } else { "disabled" };
    println!("{} {} {}", "[OK]".green(), verb, name);
    Ok(())
}
