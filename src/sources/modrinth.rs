//! Modrinth v2 API resolution.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;
use crate::Result;
use serde::Deserialize;

const API_BASE_URL: &str = "https://api.modrinth.com/v2";

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Version {
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    files: Vec<VersionFile>,
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    url: String,
    filename: Option<String>,
    size: Option<u64>,
}

/// Resolve via project search, then the first version supporting the target
/// platform.
pub async fn resolve(
    client: &reqwest::Client,
    locator: &Locator,
    platform: &str,
) -> Result<Option<ArtifactCandidate>> {
    let Some(slug) = locator.last_segment() else {
        return Ok(None);
    };

    let search_url = format!(
        "{}/search?query={}",
        API_BASE_URL,
        urlencoding::encode(slug)
    );
    let search: SearchResult = client.get(&search_url).send().await?.json().await?;

    let Some(project_id) = search.hits.first().and_then(|h| h.project_id.clone()) else {
        return Ok(None);
    };

    let versions_url = format!("{}/project/{}/version", API_BASE_URL, project_id);
    let versions: Vec<Version> = client.get(&versions_url).send().await?.json().await?;

    Ok(select_version_file(&versions, platform))
}

/// First version whose loader list contains the platform name
/// (case-insensitive substring), then its first file.
fn select_version_file(versions: &[Version], platform: &str) -> Option<ArtifactCandidate> {
    let platform = platform.to_lowercase();
    let version = versions.iter().find(|v| {
        v.loaders
            .iter()
            .any(|loader| loader.to_lowercase().contains(&platform))
    })?;
    let file = version.files.first()?;

    let mut candidate = ArtifactCandidate::new(file.url.clone());
    if let Some(name) = &file.filename {
        candidate = candidate.with_file_name(name.clone());
    }
    if let Some(size) = file.size {
        candidate = candidate.with_size(size);
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(loaders: &[&str], url: &str) -> Version {
        Version {
            loaders: loaders.iter().map(|s| s.to_string()).collect(),
            files: vec![VersionFile {
                url: url.to_string(),
                filename: None,
                size: None,
            }],
        }
    }

    #[test]
    fn test_platform_filter() {
        let versions = vec![
            version(&["fabric"], "https://example.com/fabric.jar"),
            version(&["paper", "spigot"], "https://example.com/paper.jar"),
        ];
        let candidate = select_version_file(&versions, "Paper").unwrap();
        assert_eq!(candidate.url, "https://example.com/paper.jar");
    }

    #[test]
    fn test_no_matching_loader() {
        let versions = vec![version(&["fabric"], "https://example.com/fabric.jar")];
        assert!(select_version_file(&versions, "paper").is_none());
    }
}
