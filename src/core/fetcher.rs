//! Artifact fetching and extraction.
//!
//! Turns a resolved download URL into a jar on disk. The response body is
//! always staged to a `.zip`-suffixed temp path first, then probed: if it
//! opens as a zip container the first usable jar entry is extracted,
//! otherwise the body is taken as the raw binary.

use crate::models::config::Config;
use crate::sources::{github, ArtifactCandidate};
use crate::utils::fs::{is_usable_jar_entry, move_file};
use crate::Result;
use futures::StreamExt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use zip::ZipArchive;

/// Downloads candidates into the plugins or update-staging directory.
pub struct Fetcher {
    client: reqwest::Client,
    config: Arc<Config>,
}

/// Where a base name should land: into the update-staging directory when it
/// already holds a file for that plugin, otherwise straight into the active
/// plugins directory.
pub fn decide_destination(config: &Config, base_name: &str) -> PathBuf {
    let update_dir = config.update_dir();
    let needle = base_name.to_lowercase();

    if update_dir.is_dir() {
        if let Ok(entries) = std::fs::read_dir(&update_dir) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_lowercase();
                if name.contains(&needle) {
                    return update_dir.join(format!("{}.jar", base_name));
                }
            }
        }
    }

    config.plugins_dir.join(format!("{}.jar", base_name))
}

impl Fetcher {
    pub fn new(client: reqwest::Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Download a candidate and install it under `base_name`.
    ///
    /// Returns the installed path. An archive with no usable jar entry is a
    /// soft failure: the temp file is left in place for inspection and
    /// [`crate::Error::NoJarInArchive`] is returned.
    pub async fn download(
        &self,
        candidate: &ArtifactCandidate,
        base_name: &str,
    ) -> Result<PathBuf> {
        let dest = decide_destination(&self.config, base_name);
        self.download_to(candidate, base_name, &dest).await?;
        Ok(dest)
    }

    /// Download a candidate to an explicit destination path.
    pub async fn download_to(
        &self,
        candidate: &ArtifactCandidate,
        base_name: &str,
        dest: &Path,
    ) -> Result<()> {
        let mut request = self.client.get(&candidate.url);
        if requires_bearer_auth(&candidate.url) {
            if let Some(token) = &self.config.github_token {
                request = request.header("Authorization", format!("Bearer {}", token));
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(crate::Error::DownloadStatus(response.status().as_u16()));
        }

        let parent = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent)?;
        let temp = parent.join(format!("{}.part.zip", base_name));

        // Stream chunk by chunk so large jars never sit whole in memory.
        let mut stream = response.bytes_stream();
        let mut out = tokio::fs::File::create(&temp).await?;
        while let Some(chunk) = stream.next().await {
            out.write_all(&chunk?).await?;
        }
        out.flush().await?;
        drop(out);

        install_from_temp(&temp, dest, candidate.whole_archive)
    }
}

/// Bearer authorization is attached only for GitHub's API host, where
/// workflow-artifact archives live.
fn requires_bearer_auth(url: &str) -> bool {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .is_some_and(|host| host == github::API_HOST)
}

/// Probe the temp file and finish the install.
///
/// `force_archive` is the Jenkins whole-workspace variant: the body must be
/// a zip and the same jar-selection rule applies.
fn install_from_temp(temp: &Path, dest: &Path, force_archive: bool) -> Result<()> {
    match ZipArchive::new(File::open(temp)?) {
        Ok(archive) => extract_jar_entry(archive, temp, dest),
        Err(err) if force_archive => Err(err.into()),
        Err(_) => {
            // Not a zip: the body itself is the artifact.
            move_file(temp, dest)
        }
    }
}

/// Stream the first usable jar entry out of the archive, then discard the
/// temp file. When nothing matches, the temp file stays behind.
fn extract_jar_entry(mut archive: ZipArchive<File>, temp: &Path, dest: &Path) -> Result<()> {
    let entry_index = (0..archive.len()).find(|&i| {
        archive
            .by_index(i)
            .map(|entry| !entry.is_dir() && is_usable_jar_entry(entry.name()))
            .unwrap_or(false)
    });

    let Some(index) = entry_index else {
        return Err(crate::Error::NoJarInArchive(temp.display().to_string()));
    };

    let mut entry = archive.by_index(index)?;
    let mut out = File::create(dest)?;
    io::copy(&mut entry, &mut out)?;
    drop(entry);
    drop(archive);

    std::fs::remove_file(temp)?;
    Ok(())
}
