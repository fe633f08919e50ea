//! File system utilities.

use crate::Result;
use std::path::Path;

/// Copy a file, creating the destination's parent directories as needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = std::fs::copy(from, to)?;
    Ok(bytes)
}

/// Move a file from one location to another.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Try rename first (fast, same filesystem)
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Fall back to copy + delete (cross filesystem)
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)?;
    Ok(())
}

/// Whether a zip entry name is a usable plugin jar.
///
/// Skips javadoc/sources companions and anything under an `api/` path.
pub fn is_usable_jar_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".jar")
        && !lower.contains("javadoc")
        && !lower.contains("sources")
        && !lower.contains("api/")
}

/// Whether a jar file name looks like a build output rather than a
/// companion artifact.
pub fn is_build_output_jar(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".jar")
        && !lower.contains("sources")
        && !lower.contains("javadoc")
        && !lower.contains("tests")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_usable_jar_entry() {
        assert!(is_usable_jar_entry("build/libs/foo.jar"));
        assert!(!is_usable_jar_entry("foo-javadoc.jar"));
        assert!(!is_usable_jar_entry("foo-sources.jar"));
        assert!(!is_usable_jar_entry("api/foo.jar"));
        assert!(!is_usable_jar_entry("foo.zip"));
    }

    #[test]
    fn test_is_build_output_jar() {
        assert!(is_build_output_jar("foo-1.0.jar"));
        assert!(!is_build_output_jar("foo-1.0-tests.jar"));
        assert!(!is_build_output_jar("foo-1.0-sources.jar"));
    }

    #[test]
    fn test_move_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let from = dir.path().join("a.jar");
        let to = dir.path().join("nested/b.jar");
        std::fs::write(&from, b"jar bytes").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"jar bytes");
    }
}
