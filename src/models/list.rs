//! Plugin list file model.
//!
//! The list file holds one `name: locator` record per line. A leading `#`
//! marks an entry administratively disabled: it is skipped by batch updates
//! but kept in the file and visible to list/enable/disable. Mutations
//! rewrite the whole file, preserving every other line verbatim.

use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// One record from the plugin list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub locator: String,
    pub enabled: bool,
}

/// A line of the list file, kept verbatim when it is not a record.
#[derive(Debug, Clone)]
enum Line {
    Entry(ListEntry),
    Raw(String),
}

/// The plugin list file.
#[derive(Debug)]
pub struct PluginList {
    path: PathBuf,
    lines: Vec<Line>,
}

impl PluginList {
    /// Load the list file, creating an empty list when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.exists() {
            fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut lines = Vec::new();
        for raw in content.lines() {
            lines.push(parse_line(raw));
        }

        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// All records in file order, enabled and disabled alike.
    pub fn entries(&self) -> Vec<&ListEntry> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                Line::Entry(e) => Some(e),
                Line::Raw(_) => None,
            })
            .collect()
    }

    /// Records eligible for a batch run.
    pub fn enabled_entries(&self) -> Vec<&ListEntry> {
        self.entries().into_iter().filter(|e| e.enabled).collect()
    }

    /// Look up a record by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&ListEntry> {
        self.entries()
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Append a new record. Fails when the name already exists.
    pub fn add(&mut self, name: &str, locator: &str) -> Result<()> {
        if self.get(name).is_some() {
            return Err(crate::Error::DuplicateEntry(name.to_string()));
        }
        self.lines.push(Line::Entry(ListEntry {
            name: name.to_string(),
            locator: locator.to_string(),
            enabled: true,
        }));
        self.save()
    }

    /// Remove a record by name.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let before = self.lines.len();
        self.lines.retain(|l| match l {
            Line::Entry(e) => !e.name.eq_ignore_ascii_case(name),
            Line::Raw(_) => true,
        });
        if self.lines.len() == before {
            return Err(crate::Error::EntryNotFound(name.to_string()));
        }
        self.save()
    }

    /// Enable or disable a record by name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let mut found = false;
        for line in &mut self.lines {
            if let Line::Entry(e) = line {
                if e.name.eq_ignore_ascii_case(name) {
                    e.enabled = enabled;
                    found = true;
                }
            }
        }
        if !found {
            return Err(crate::Error::EntryNotFound(name.to_string()));
        }
        self.save()
    }

    /// Rewrite the whole file from the in-memory lines.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&render_line(line));
            out.push('\n');
        }
        fs::write(&self.path, out)?;
        Ok(())
    }
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    let (body, enabled) = match trimmed.strip_prefix('#') {
        Some(rest) => (rest.trim_start(), false),
        None => (trimmed, true),
    };

    if let Some((name, locator)) = body.split_once(':') {
        let name = name.trim();
        let locator = locator.trim();
        if !name.is_empty() && !locator.is_empty() {
            return Line::Entry(ListEntry {
                name: name.to_string(),
                locator: locator.to_string(),
                enabled,
            });
        }
    }

    Line::Raw(raw.to_string())
}

fn render_line(line: &Line) -> String {
    match line {
        Line::Entry(e) if e.enabled => format!("{}: {}", e.name, e.locator),
        Line::Entry(e) => format!("# {}: {}", e.name, e.locator),
        Line::Raw(raw) => raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enabled_and_disabled() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plugins.txt");
        fs::write(
            &path,
            "Essentials: https://www.spigotmc.org/resources/essentialsx.9089/\n# Foo: https://github.com/acme/foo\n",
        )
        .unwrap();

        let list = PluginList::load(&path).unwrap();
        let entries = list.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].enabled);
        assert!(!entries[1].enabled);
        assert_eq!(list.enabled_entries().len(), 1);
    }

    #[test]
    fn test_enable_disable_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plugins.txt");
        let original = "# Foo: https://github.com/acme/foo\n";
        fs::write(&path, original).unwrap();

        let mut list = PluginList::load(&path).unwrap();
        list.set_enabled("Foo", true).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Foo: https://github.com/acme/foo\n"
        );

        list.set_enabled("Foo", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_listing_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plugins.txt");
        fs::write(&path, "A: https://a.example/\nB: https://b.example/\n").unwrap();

        let list = PluginList::load(&path).unwrap();
        let first: Vec<ListEntry> = list.entries().into_iter().cloned().collect();
        let second: Vec<ListEntry> = list.entries().into_iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_remove() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plugins.txt");

        let mut list = PluginList::load(&path).unwrap();
        list.add("Foo", "https://github.com/acme/foo").unwrap();
        assert!(list.add("foo", "https://elsewhere.example/").is_err());

        list.remove("Foo").unwrap();
        assert!(list.remove("Foo").is_err());
        assert!(list.entries().is_empty());
    }

    #[test]
    fn test_non_record_lines_preserved() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plugins.txt");
        fs::write(&path, "\nA: https://a.example/\n").unwrap();

        let mut list = PluginList::load(&path).unwrap();
        list.add("B", "https://b.example/").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\nA: https://a.example/\nB: https://b.example/\n"
        );
    }
}
