//! JitPack remote-build resolution.
//!
//! When nothing builds locally, JitPack compiles the repository on demand:
//! requesting the jar URL once triggers a build, and the status endpoint is
//! polled with fixed backoff until it settles.

use crate::models::config::BuildConfig;
use crate::models::locator::Locator;
use crate::sources::{github, ArtifactCandidate};
use crate::{core::builder::Repo, Result};
use serde::Deserialize;
use std::time::Duration;

const JITPACK_BASE_URL: &str = "https://jitpack.io";

/// Downloads smaller than this are assumed to be error pages, not jars.
pub const MIN_JAR_SIZE: u64 = 1024;

#[derive(Debug, Deserialize)]
struct BuildStatus {
    status: Option<String>,
    /// Jar path relative to the JitPack root, when the status reports one.
    jar: Option<String>,
}

fn status_url(repo: &Repo, version: &str) -> String {
    format!(
        "{}/api/builds/com.github.{}/{}/{}",
        JITPACK_BASE_URL, repo.owner, repo.name, version
    )
}

fn jar_url(repo: &Repo, version: &str) -> String {
    format!(
        "{}/com/github/{}/{}/{}/{}-{}.jar",
        JITPACK_BASE_URL, repo.owner, repo.name, version, repo.name, version
    )
}

/// The two version strings tried: the resolved branch, and the opposite of
/// the master/main pair. Deliberately not generalized further.
pub fn version_candidates(branch: &str) -> Vec<String> {
    let alternate = if branch == "master" { "main" } else { "master" };
    let mut versions = vec![format!("{}-SNAPSHOT", branch)];
    let alt = format!("{}-SNAPSHOT", alternate);
    if !versions.contains(&alt) {
        versions.push(alt);
    }
    versions
}

/// Resolve a jar URL for a repo via JitPack, triggering and polling a remote
/// build when none exists yet.
pub async fn resolve_repo(
    client: &reqwest::Client,
    repo: &Repo,
    config: &BuildConfig,
) -> Result<Option<ArtifactCandidate>> {
    for version in version_candidates(&repo.branch) {
        match resolve_version(client, repo, &version, config).await {
            Ok(Some(candidate)) => return Ok(Some(candidate)),
            Ok(None) => continue,
            Err(err) => {
                tracing::debug!("jitpack {} failed: {}", version, err);
                continue;
            }
        }
    }
    Ok(None)
}

/// Resolve a `jitpack.io` locator directly: parse owner/repo out of the URL,
/// resolve the default branch best-effort, then go through the normal
/// trigger-and-poll path.
pub async fn resolve_locator(
    client: &reqwest::Client,
    locator: &Locator,
    config: &BuildConfig,
) -> Result<Option<ArtifactCandidate>> {
    let Some((owner, name)) = parse_jitpack_path(locator) else {
        return Ok(None);
    };
    let mut repo = Repo {
        owner,
        name,
        branch: "master".to_string(),
    };
    if let Ok(Some(branch)) = github::default_branch(client, &repo.owner, &repo.name, None).await {
        repo.branch = branch;
    }
    resolve_repo(client, &repo, config).await
}

/// Accepts both `jitpack.io/#owner/repo` and `jitpack.io/com/github/owner/repo`.
fn parse_jitpack_path(locator: &Locator) -> Option<(String, String)> {
    let segments: Vec<&str> = locator
        .path_segments()
        .into_iter()
        .skip(1) // host
        .flat_map(|s| s.split('#'))
        .filter(|s| !s.is_empty() && *s != "com" && *s != "github")
        .collect();
    if segments.len() < 2 {
        return None;
    }
    Some((segments[0].to_string(), segments[1].to_string()))
}

async fn resolve_version(
    client: &reqwest::Client,
    repo: &Repo,
    version: &str,
    config: &BuildConfig,
) -> Result<Option<ArtifactCandidate>> {
    let status = fetch_status(client, repo, version).await?;

    let status = match status {
        Some(status) => status,
        None => {
            // Not built yet: request the jar once to trigger, then poll.
            tracing::info!(
                "triggering jitpack build of {}/{} {}",
                repo.owner,
                repo.name,
                version
            );
            let _ = client.get(jar_url(repo, version)).send().await;
            match poll_status(client, repo, version, config).await? {
                Some(status) => status,
                None => return Ok(None),
            }
        }
    };

    if !status_ok(&status) {
        return Ok(None);
    }

    let url = match &status.jar {
        Some(path) => format!("{}/{}", JITPACK_BASE_URL, path.trim_start_matches('/')),
        None => jar_url(repo, version),
    };
    Ok(Some(ArtifactCandidate::new(url)))
}

/// `Ok(None)` means the build-status endpoint reports not-found.
async fn fetch_status(
    client: &reqwest::Client,
    repo: &Repo,
    version: &str,
) -> Result<Option<BuildStatus>> {
    let response = client.get(status_url(repo, version)).send().await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let status: BuildStatus = response.json().await?;
    if status.status.as_deref() == Some("not found") {
        return Ok(None);
    }
    Ok(Some(status))
}

async fn poll_status(
    client: &reqwest::Client,
    repo: &Repo,
    version: &str,
    config: &BuildConfig,
) -> Result<Option<BuildStatus>> {
    for attempt in 1..=config.max_polls {
        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;

        match fetch_status(client, repo, version).await {
            Ok(Some(status)) => {
                match status.status.as_deref() {
                    Some("building") | None => {
                        tracing::debug!("jitpack poll {}/{}: building", attempt, config.max_polls);
                    }
                    _ => return Ok(Some(status)),
                }
            }
            Ok(None) => {
                tracing::debug!("jitpack poll {}/{}: not found yet", attempt, config.max_polls);
            }
            Err(err) => {
                tracing::debug!("jitpack poll {}/{}: {}", attempt, config.max_polls, err);
            }
        }
    }
    Ok(None)
}

fn status_ok(status: &BuildStatus) -> bool {
    matches!(status.status.as_deref(), Some("ok") | Some("success"))
}
