//! dev.bukkit.org resolution.
//!
//! The host redirects `files/latest` to the actual binary, so resolution is
//! pure URL composition.

use crate::models::locator::Locator;
use crate::sources::ArtifactCandidate;

/// Append `files/latest` to the project page URL.
pub fn resolve(locator: &Locator) -> ArtifactCandidate {
    ArtifactCandidate::new(format!("{}files/latest", locator.url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let locator = Locator::parse("https://dev.bukkit.org/projects/worldedit").unwrap();
        assert_eq!(
            resolve(&locator).url,
            "https://dev.bukkit.org/projects/worldedit/files/latest"
        );
    }
}
