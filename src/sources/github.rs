//! GitHub release and workflow-artifact resolution.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;
use crate::Result;
use serde::Deserialize;

pub const API_BASE_URL: &str = "https://api.github.com";

/// Host whose artifact downloads require bearer authorization.
pub const API_HOST: &str = "api.github.com";

/// One release, most recent first in API order.
#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
    #[serde(default)]
    artifacts: Vec<WorkflowArtifact>,
}

#[derive(Debug, Deserialize)]
struct WorkflowArtifact {
    name: Option<String>,
    archive_download_url: Option<String>,
    size_in_bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

/// Owner and repository parsed from a GitHub locator.
pub fn owner_repo(locator: &Locator) -> Option<(String, String)> {
    let segments = locator.path_segments();
    // segments[0] is the host.
    if segments.len() < 3 {
        return None;
    }
    Some((segments[1].to_string(), segments[2].to_string()))
}

fn build_request(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    let request = client.get(url);
    match token {
        Some(token) => request.header("Authorization", format!("Bearer {}", token)),
        None => request,
    }
}

/// Resolve the n-th `.jar` release asset across releases in API order.
///
/// The first release's jars count before the second release's, so index 2
/// with a one-jar first release lands on the second release's first jar.
pub async fn resolve_release(
    client: &reqwest::Client,
    locator: &Locator,
    token: Option<&str>,
) -> Result<Option<ArtifactCandidate>> {
    let Some((owner, repo)) = owner_repo(locator) else {
        return Ok(None);
    };

    let url = format!("{}/repos/{}/{}/releases", API_BASE_URL, owner, repo);
    let releases: Vec<Release> = build_request(client, &url, token).send().await?.json().await?;

    Ok(select_jar_asset(&releases, locator.artifact_index))
}

fn select_jar_asset(releases: &[Release], index: usize) -> Option<ArtifactCandidate> {
    let mut seen = 0usize;
    for release in releases {
        for asset in &release.assets {
            if !asset.name.ends_with(".jar") {
                continue;
            }
            seen += 1;
            if seen == index {
                let mut candidate = ArtifactCandidate::new(asset.browser_download_url.clone())
                    .with_file_name(asset.name.clone());
                if let Some(size) = asset.size {
                    candidate = candidate.with_size(size);
                }
                return Some(candidate);
            }
        }
    }
    None
}

/// Resolve the n-th named workflow artifact, by encounter order.
///
/// The archive URL lives on the API host, so the fetcher attaches the bearer
/// token when one is configured.
pub async fn resolve_actions_artifact(
    client: &reqwest::Client,
    locator: &Locator,
    token: Option<&str>,
) -> Result<Option<ArtifactCandidate>> {
    // The `/actions` suffix picks the strategy; owner/repo parsing ignores it.
    let Some((owner, repo)) = owner_repo(locator) else {
        return Ok(None);
    };

    let url = format!(
        "{}/repos/{}/{}/actions/artifacts",
        API_BASE_URL, owner, repo
    );
    let list: ArtifactList = build_request(client, &url, token).send().await?.json().await?;

    let mut seen = 0usize;
    for artifact in &list.artifacts {
        let Some(name) = &artifact.name else { continue };
        seen += 1;
        if seen == locator.artifact_index {
            let Some(archive_url) = &artifact.archive_download_url else {
                return Ok(None);
            };
            let mut candidate = ArtifactCandidate::new(archive_url.clone())
                .with_file_name(format!("{}.jar", name));
            if let Some(size) = artifact.size_in_bytes {
                candidate = candidate.with_size(size);
            }
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Look up the repository's default branch. Best-effort: callers keep their
/// initial guess when this fails.
pub async fn default_branch(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
    token: Option<&str>,
) -> Result<Option<String>> {
    let url = format!("{}/repos/{}/{}", API_BASE_URL, owner, repo);
    let info: RepoInfo = build_request(client, &url, token).send().await?.json().await?;
    Ok(info.default_branch)
}
