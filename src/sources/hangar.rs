//! Hangar v1 API resolution.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;
use crate::Result;

const API_BASE_URL: &str = "https://hangar.papermc.io/api/v1";

/// Resolve the latest release version and compose the per-platform download
/// URL. The latest-release endpoint returns the bare version string.
pub async fn resolve(
    client: &reqwest::Client,
    locator: &Locator,
    platform: &str,
) -> Result<Option<ArtifactCandidate>> {
    let Some(project) = locator.last_segment().map(str::to_string) else {
        return Ok(None);
    };

    let version_url = format!("{}/projects/{}/latestrelease", API_BASE_URL, project);
    let response = client.get(&version_url).send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    let version = response.text().await?.trim().to_string();
    if version.is_empty() {
        return Ok(None);
    }

    Ok(Some(ArtifactCandidate::new(download_url(
        &project, &version, platform,
    ))))
}

fn download_url(project: &str, version: &str, platform: &str) -> String {
    format!(
        "{}/projects/{}/versions/{}/{}/download",
        API_BASE_URL,
        project,
        version,
        platform.to_uppercase()
    )
}
