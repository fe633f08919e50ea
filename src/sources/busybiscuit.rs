//! TheBusyBiscuit build-aggregator resolution.
//!
//! The aggregator publishes a per-repo `builds.json` manifest under the
//! `master` channel; `last_successful` names the build number of the newest
//! good jar.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;
use crate::Result;
use regex::Regex;
use serde::Deserialize;

const BUILDS_BASE_URL: &str = "https://thebusybiscuit.github.io/builds";

#[derive(Debug, Deserialize)]
struct BuildsManifest {
    last_successful: Option<u32>,
}

/// Extract `<owner>/<repo>` from the `builds/<owner>/<repo>` path.
fn owner_repo(url: &str) -> Option<(String, String)> {
    // Compiled per call; resolution is rare enough that caching is not worth
    // a lazy static here.
    let re = Regex::new(r"builds/([^/]+)/([^/\[]+)").ok()?;
    let caps = re.captures(url)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

pub async fn resolve(
    client: &reqwest::Client,
    locator: &Locator,
) -> Result<Option<ArtifactCandidate>> {
    let Some((owner, repo)) = owner_repo(&locator.url) else {
        return Ok(None);
    };

    let manifest_url = format!("{}/{}/{}/master/builds.json", BUILDS_BASE_URL, owner, repo);
    let manifest: BuildsManifest = client.get(&manifest_url).send().await?.json().await?;

    let Some(build) = manifest.last_successful else {
        return Ok(None);
    };

    let file_name = format!("{}-{}.jar", repo, build);
    Ok(Some(
        ArtifactCandidate::new(format!(
            "{}/{}/{}/master/{}",
            BUILDS_BASE_URL, owner, repo, file_name
        ))
        .with_file_name(file_name),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_repo() {
        assert_eq!(
            owner_repo("https://thebusybiscuit.github.io/builds/TheBusyBiscuit/Slimefun4/"),
            Some(("TheBusyBiscuit".to_string(), "Slimefun4".to_string()))
        );
        assert_eq!(owner_repo("https://thebusybiscuit.github.io/"), None);
    }

    #[test]
    fn test_manifest_shape() {
        let manifest: BuildsManifest =
            serde_json::from_str(r#"{"last_successful": 1114}"#).unwrap();
        assert_eq!(manifest.last_successful, Some(1114));
    }
}
