//! Jenkins last-successful-build resolution.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;
use crate::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BuildInfo {
    #[serde(default)]
    artifacts: Vec<BuildArtifact>,
}

#[derive(Debug, Deserialize)]
struct BuildArtifact {
    #[serde(rename = "fileName")]
    file_name: Option<String>,
    #[serde(rename = "relativePath")]
    relative_path: Option<String>,
}

/// Resolve a download URL from the job's lastSuccessfulBuild JSON API.
///
/// When the JSON API cannot be reached at all, falls back to the
/// whole-workspace archive download. The archive fallback carries no
/// multi-artifact index support; it always applies the standard jar
/// selection rule during extraction.
pub async fn resolve(
    client: &reqwest::Client,
    locator: &Locator,
) -> Result<Option<ArtifactCandidate>> {
    let base = locator.url.trim_end_matches('/');
    let api_url = format!("{}/lastSuccessfulBuild/api/json", base);

    let info: BuildInfo = match fetch_build_info(client, &api_url).await {
        Ok(info) => info,
        Err(err) => {
            tracing::debug!("Jenkins JSON API failed ({}), using archive fallback", err);
            let mut candidate = ArtifactCandidate::new(format!(
                "{}/lastSuccessfulBuild/artifact/*zip*/archive.zip",
                base
            ));
            candidate.whole_archive = true;
            return Ok(Some(candidate));
        }
    };

    match select_artifact(&info, locator.artifact_index) {
        Some(artifact) => candidate_for(base, artifact).map(Some),
        None => Ok(None),
    }
}

/// Compose the download URL for a selected artifact. An artifact record
/// without a `relativePath` cannot be addressed and fails the resolution.
fn candidate_for(base: &str, artifact: &BuildArtifact) -> Result<ArtifactCandidate> {
    let relative_path =
        artifact
            .relative_path
            .as_deref()
            .ok_or(crate::Error::ApiResponse {
                api: "Jenkins",
                reason: "artifact has no relativePath".to_string(),
            })?;
    let mut candidate = ArtifactCandidate::new(format!(
        "{}/lastSuccessfulBuild/artifact/{}",
        base, relative_path
    ));
    if let Some(name) = &artifact.file_name {
        candidate = candidate.with_file_name(name.clone());
    }
    Ok(candidate)
}

async fn fetch_build_info(client: &reqwest::Client, url: &str) -> Result<BuildInfo> {
    let info = client.get(url).send().await?.json().await?;
    Ok(info)
}

/// Pick the n-th artifact, falling back to the first when the index exceeds
/// the artifact count. Only an empty artifacts array is a miss.
fn select_artifact(info: &BuildInfo, index: usize) -> Option<&BuildArtifact> {
    if info.artifacts.is_empty() {
        return None;
    }
    info.artifacts.get(index - 1).or_else(|| info.artifacts.first())
}
