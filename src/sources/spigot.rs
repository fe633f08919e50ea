//! Spigot resource resolution via the Spiget API.
//!
//! Spigot resource pages end in `.<resource-id>/`; the download itself goes
//! through the third-party Spiget mirror, so no request is needed to resolve.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;

const SPIGET_DOWNLOAD_URL: &str = "https://api.spiget.org/v2/resources";

/// Compose the Spiget download URL from the resource id in the locator.
///
/// Returns `None` when no numeric id can be extracted.
pub fn resolve(locator: &Locator) -> Option<ArtifactCandidate> {
    let id = resource_id(&locator.url)?;
    Some(ArtifactCandidate::new(format!(
        "{}/{}/download",
        SPIGET_DOWNLOAD_URL, id
    )))
}

/// Extract the numeric resource id from a `...name.<digits>/` page URL.
fn resource_id(url: &str) -> Option<&str> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next()?;
    let id = last.rsplit('.').next()?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id() {
        assert_eq!(
            resource_id("https://www.spigotmc.org/resources/essentialsx.9089/"),
            Some("9089")
        );
        assert_eq!(
            resource_id("https://www.spigotmc.org/resources/essentialsx.9089"),
            Some("9089")
        );
        assert_eq!(
            resource_id("https://www.spigotmc.org/resources/no-id-here/"),
            None
        );
    }

    #[test]
    fn test_resolve_composes_spiget_url() {
        let locator =
            Locator::parse("https://www.spigotmc.org/resources/essentialsx.9089/").unwrap();
        let candidate = resolve(&locator).unwrap();
        assert_eq!(
            candidate.url,
            "https://api.spiget.org/v2/resources/9089/download"
        );
    }

    #[test]
    fn test_resolve_without_id_is_not_found() {
        let locator = Locator::parse("https://www.spigotmc.org/resources/unknown/").unwrap();
        assert!(resolve(&locator).is_none());
    }
}
