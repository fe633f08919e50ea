//! Source resolution strategies.
//!
//! One module per artifact-hosting convention. Each strategy turns a
//! classified [`Locator`] into a concrete download URL, or `None` when the
//! source has nothing matching. Responses are deserialized into typed
//! records per API; a missing field is a resolution failure, not a crash.

pub mod blobbuild;
pub mod bukkit;
pub mod busybiscuit;
pub mod github;
pub mod hangar;
pub mod jenkins;
pub mod modrinth;
pub mod spigot;

use crate::models::config::Config;
use crate::models::locator::{Locator, SourceKind};
use crate::Result;
use std::sync::Arc;

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("plugin-updater/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client with the fixed user agent.
pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// A resolved download target, produced here and consumed by the fetcher.
#[derive(Debug, Clone)]
pub struct ArtifactCandidate {
    /// Absolute download URL.
    pub url: String,
    /// Suggested file name, where the source exposes one.
    pub file_name: Option<String>,
    /// Estimated size in bytes, where known.
    pub size: Option<u64>,
    /// The URL is a whole-workspace archive and must always be unpacked.
    pub whole_archive: bool,
}

impl ArtifactCandidate {
    pub fn new(url: String) -> Self {
        Self {
            url,
            file_name: None,
            size: None,
            whole_archive: false,
        }
    }

    pub fn with_file_name(mut self, name: String) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Dispatches a classified locator to its strategy.
pub struct SourceResolver {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl SourceResolver {
    pub fn new(client: reqwest::Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Resolve a locator to a download candidate.
    ///
    /// `Ok(None)` means the source answered but has no matching artifact.
    pub async fn resolve(&self, locator: &Locator) -> Result<Option<ArtifactCandidate>> {
        match locator.kind {
            SourceKind::SpigotResource => Ok(spigot::resolve(locator)),
            SourceKind::GitHubRelease => {
                github::resolve_release(
                    &self.client,
                    locator,
                    self.config.github_token.as_deref(),
                )
                .await
            }
            SourceKind::GitHubActionsArtifact => {
                github::resolve_actions_artifact(
                    &self.client,
                    locator,
                    self.config.github_token.as_deref(),
                )
                .await
            }
            SourceKind::Jenkins | SourceKind::JenkinsAlternate => {
                jenkins::resolve(&self.client, locator).await
            }
            SourceKind::BukkitDev => Ok(Some(bukkit::resolve(locator))),
            SourceKind::Modrinth => {
                modrinth::resolve(&self.client, locator, &self.config.platform).await
            }
            SourceKind::Hangar => {
                hangar::resolve(&self.client, locator, &self.config.platform).await
            }
            SourceKind::BlobBuild => blobbuild::resolve(&self.client, locator).await,
            SourceKind::BusyBiscuit => busybiscuit::resolve(&self.client, locator).await,
            SourceKind::JitPackViaGitHub => {
                crate::core::jitpack::resolve_locator(&self.client, locator, &self.config.build)
                    .await
            }
            SourceKind::Direct => Ok(Some(ArtifactCandidate::new(locator.url.clone()))),
        }
    }
}
