//! Locator model and source classification.
//!
//! A locator is the raw string a user writes in the plugin list to say where
//! a plugin comes from. Classification is pure string matching: no network
//! I/O happens here.

use crate::Result;

/// The artifact-hosting convention a locator points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    SpigotResource,
    GitHubRelease,
    GitHubActionsArtifact,
    Jenkins,
    JenkinsAlternate,
    BukkitDev,
    Modrinth,
    Hangar,
    JitPackViaGitHub,
    BlobBuild,
    BusyBiscuit,
    /// Anything unrecognized: the locator itself is the download URL.
    Direct,
}

/// Source phrases that identify a hosted convention. Checked in order:
/// aggregator domains come first because their URLs can also contain
/// "github" or "jenkins".
const SOURCE_PHRASES: &[(&str, SourceKind)] = &[
    ("blob.build", SourceKind::BlobBuild),
    ("thebusybiscuit.github.io/builds", SourceKind::BusyBiscuit),
    ("jitpack.io", SourceKind::JitPackViaGitHub),
    ("spigotmc.org", SourceKind::SpigotResource),
    ("dev.bukkit.org", SourceKind::BukkitDev),
    ("modrinth.com", SourceKind::Modrinth),
    ("hangar.papermc.io", SourceKind::Hangar),
    ("github.com", SourceKind::GitHubRelease),
    ("jenkins", SourceKind::Jenkins),
    ("/job/", SourceKind::JenkinsAlternate),
];

/// A classified locator.
#[derive(Debug, Clone)]
pub struct Locator {
    /// The locator exactly as written in the list file.
    pub raw: String,
    /// The normalized URL with any bracket suffix stripped.
    pub url: String,
    /// Which source convention the locator matches.
    pub kind: SourceKind,
    /// 1-based index selecting the n-th artifact when a source exposes
    /// several build outputs. Defaults to 1.
    pub artifact_index: usize,
}

impl Locator {
    /// Parse and classify a raw locator string.
    ///
    /// Bracket syntax `url[n]` is stripped and parsed first; a malformed
    /// bracket suffix is an error, not a silent default. The URL is then
    /// normalized with a trailing `/` when it matches a recognized source
    /// phrase, so downstream path splitting behaves uniformly.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (mut url, artifact_index) = split_artifact_index(raw)?;

        if !url.ends_with('/') && matches_source_phrase(&url) {
            url.push('/');
        }

        let kind = classify(&url);

        Ok(Self {
            raw: raw.to_string(),
            url,
            kind,
            artifact_index,
        })
    }

    /// Non-empty path segments of the URL, in order.
    pub fn path_segments(&self) -> Vec<&str> {
        self.url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The last non-empty path segment, if any.
    pub fn last_segment(&self) -> Option<&str> {
        self.path_segments().last().copied()
    }
}

/// Classify a locator URL into a source kind by substring containment.
pub fn classify(url: &str) -> SourceKind {
    let lower = url.to_lowercase();
    for (phrase, kind) in SOURCE_PHRASES {
        if lower.contains(phrase) {
            if *kind == SourceKind::GitHubRelease && is_actions_locator(&lower) {
                return SourceKind::GitHubActionsArtifact;
            }
            return *kind;
        }
    }
    SourceKind::Direct
}

/// A GitHub locator ending in `/actions` selects workflow artifacts
/// instead of releases.
fn is_actions_locator(lower: &str) -> bool {
    lower.ends_with("/actions") || lower.ends_with("/actions/")
}

fn matches_source_phrase(url: &str) -> bool {
    let lower = url.to_lowercase();
    SOURCE_PHRASES.iter().any(|(phrase, _)| lower.contains(phrase))
}

/// Split a trailing `[n]` artifact index off a locator.
///
/// Returns the base locator and the 1-based index (1 when absent).
fn split_artifact_index(raw: &str) -> Result<(String, usize)> {
    if !raw.ends_with(']') {
        // A '[' with no closing bracket after it is malformed.
        if let Some(open) = raw.rfind('[') {
            if raw.rfind(']').map_or(true, |close| close < open) {
                return Err(crate::Error::InvalidArtifactIndex(raw.to_string()));
            }
        }
        return Ok((raw.to_string(), 1));
    }

    let open = raw
        .rfind('[')
        .ok_or_else(|| crate::Error::InvalidArtifactIndex(raw.to_string()))?;
    let inner = &raw[open + 1..raw.len() - 1];
    let index: usize = inner
        .parse()
        .map_err(|_| crate::Error::InvalidArtifactIndex(raw.to_string()))?;
    if index == 0 {
        return Err(crate::Error::InvalidArtifactIndex(raw.to_string()));
    }

    Ok((raw[..open].to_string(), index))
}
