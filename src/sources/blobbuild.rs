//! blob.build builds API resolution.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;
use crate::Result;
use serde::Deserialize;

const API_BASE_URL: &str = "https://blob.build/api/builds";

#[derive(Debug, Deserialize)]
struct BuildResponse {
    success: bool,
    error: Option<String>,
    data: Option<BuildData>,
}

#[derive(Debug, Deserialize)]
struct BuildData {
    #[serde(rename = "fileDownloadUrl")]
    file_download_url: Option<String>,
}

/// Resolve the latest build of `<project>/<channel>`, the last two path
/// segments of the locator. A non-success response aborts with the embedded
/// error text.
pub async fn resolve(
    client: &reqwest::Client,
    locator: &Locator,
) -> Result<Option<ArtifactCandidate>> {
    let segments = locator.path_segments();
    if segments.len() < 2 {
        return Ok(None);
    }
    let channel = segments[segments.len() - 1];
    let project = segments[segments.len() - 2];

    let url = format!("{}/{}/{}/latest", API_BASE_URL, project, channel);
    let response: BuildResponse = client.get(&url).send().await?.json().await?;

    if !response.success {
        return Err(crate::Error::ApiResponse {
            api: "blob.build",
            reason: response.error.unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    Ok(response
        .data
        .and_then(|d| d.file_download_url)
        .map(ArtifactCandidate::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let ok: BuildResponse = serde_json::from_str(
            r#"{"success":true,"data":{"fileDownloadUrl":"https://blob.build/dl/x.jar"}}"#,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(
            ok.data.unwrap().file_download_url.as_deref(),
            Some("https://blob.build/dl/x.jar")
        );

        let err: BuildResponse =
            serde_json::from_str(r#"{"success":false,"error":"no such project"}"#).unwrap();
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("no such project"));
    }
}
