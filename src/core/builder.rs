//! Source-build fallback.
//!
//! When GitHub has no matching release asset, the repository is snapshotted
//! and compiled locally: Gradle wrapper, then Maven wrapper, then the
//! system-installed tools, first one that exits zero within the timeout
//! wins. When nothing builds, JitPack's remote build farm is the last
//! resort.

use crate::models::config::Config;
use crate::models::locator::Locator;
use crate::sources::github;
use crate::utils::fs::{copy_file, is_build_output_jar};
use crate::{core::jitpack, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use walkdir::WalkDir;

const CODELOAD_BASE_URL: &str = "https://codeload.github.com";

/// A GitHub repository with a resolved (or guessed) branch.
#[derive(Debug, Clone)]
pub struct Repo {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl Repo {
    /// Derive a repo from a GitHub locator. The branch starts as the
    /// `master` guess until the upstream default branch is resolved.
    pub fn from_locator(locator: &Locator) -> Option<Self> {
        let (owner, name) = github::owner_repo(locator)?;
        Some(Self {
            owner,
            name,
            branch: "master".to_string(),
        })
    }
}

/// A build tool invocation candidate, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    GradleWrapper,
    MavenWrapper,
    Gradle,
    Maven,
}

impl BuildTool {
    pub const ORDER: [BuildTool; 4] = [
        BuildTool::GradleWrapper,
        BuildTool::MavenWrapper,
        BuildTool::Gradle,
        BuildTool::Maven,
    ];

    /// Program to execute, relative to the project dir for wrappers.
    fn program(self, project_dir: &Path) -> PathBuf {
        match self {
            BuildTool::GradleWrapper => project_dir.join("gradlew"),
            BuildTool::MavenWrapper => project_dir.join("mvnw"),
            BuildTool::Gradle => PathBuf::from("gradle"),
            BuildTool::Maven => PathBuf::from("mvn"),
        }
    }

    fn args(self) -> &'static [&'static str] {
        match self {
            BuildTool::GradleWrapper | BuildTool::Gradle => &["build", "-x", "test"],
            BuildTool::MavenWrapper | BuildTool::Maven => &["-q", "-DskipTests", "package"],
        }
    }

    /// Wrappers are only attempted when bundled with the project.
    pub fn is_present(self, project_dir: &Path) -> bool {
        match self {
            BuildTool::GradleWrapper | BuildTool::MavenWrapper => {
                self.program(project_dir).is_file()
            }
            // System tools: spawning decides.
            BuildTool::Gradle | BuildTool::Maven => true,
        }
    }
}

/// Pick the first present tool; callers move to the next only when the
/// chosen one fails to produce a zero exit.
pub fn present_tools(project_dir: &Path) -> Vec<BuildTool> {
    BuildTool::ORDER
        .iter()
        .copied()
        .filter(|tool| tool.is_present(project_dir))
        .collect()
}

/// Working directory removed on drop, success or not.
struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!(
            "plugin-build-{}",
            Utc::now().format("%Y%m%d%H%M%S%f")
        ));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Runs the source-build fallback for one GitHub repository.
pub struct SourceBuilder {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl SourceBuilder {
    pub fn new(client: reqwest::Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Full fallback sequence. Returns the installed jar path, or `None`
    /// when every strategy came up empty.
    pub async fn run(&self, locator: &Locator, dest: &Path) -> Result<Option<PathBuf>> {
        let Some(mut repo) = Repo::from_locator(locator) else {
            return Ok(None);
        };
        let token = self.config.github_token.as_deref();

        // Best-effort default branch resolution; keep the guess on failure.
        match github::default_branch(&self.client, &repo.owner, &repo.name, token).await {
            Ok(Some(branch)) => repo.branch = branch,
            Ok(None) => {}
            Err(err) => tracing::debug!("default branch lookup failed: {}", err),
        }

        // One more release-asset attempt now that the branch is known.
        if let Some(candidate) = github::resolve_release(&self.client, locator, token).await? {
            tracing::info!("release asset appeared for {}/{}", repo.owner, repo.name);
            let fetcher =
                crate::core::fetcher::Fetcher::new(self.client.clone(), self.config.clone());
            fetcher
                .download_to(&candidate, &stem_of(dest), dest)
                .await?;
            return Ok(Some(dest.to_path_buf()));
        }

        match self.build_locally(&repo, dest).await {
            Ok(Some(path)) => return Ok(Some(path)),
            Ok(None) => {}
            Err(err) => tracing::warn!("local build of {}/{} failed: {}", repo.owner, repo.name, err),
        }

        self.build_remotely(&repo, dest).await
    }

    /// Snapshot, unpack and compile the repository locally.
    async fn build_locally(&self, repo: &Repo, dest: &Path) -> Result<Option<PathBuf>> {
        let workdir = WorkDir::create()?;

        let snapshot = workdir.path.join("source.zip");
        self.download_snapshot(repo, &snapshot).await?;

        let source_dir = workdir.path.join("source");
        unpack_snapshot(&snapshot, &source_dir)?;
        let project_dir = project_root(&source_dir);

        if !self.try_build(&project_dir).await? {
            return Ok(None);
        }

        let Some(jar) = find_largest_jar(&project_dir) else {
            tracing::warn!("build of {}/{} produced no jar", repo.owner, repo.name);
            return Ok(None);
        };

        copy_file(&jar, dest)?;
        Ok(Some(dest.to_path_buf()))
    }

    async fn download_snapshot(&self, repo: &Repo, dest: &Path) -> Result<()> {
        let url = format!(
            "{}/{}/{}/zip/refs/heads/{}",
            CODELOAD_BASE_URL, repo.owner, repo.name, repo.branch
        );
        tracing::info!("downloading source snapshot {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(crate::Error::DownloadStatus(response.status().as_u16()));
        }
        std::fs::write(dest, response.bytes().await?)?;
        Ok(())
    }

    /// Try each available tool in order until one exits zero.
    async fn try_build(&self, project_dir: &Path) -> Result<bool> {
        let tools = present_tools(project_dir);
        if tools.is_empty() {
            return Err(crate::Error::NoBuildTool(
                project_dir.display().to_string(),
            ));
        }

        for tool in tools {
            match self.run_tool(tool, project_dir).await {
                Ok(true) => return Ok(true),
                Ok(false) => tracing::warn!("{:?} exited non-zero, trying next tool", tool),
                Err(err) => tracing::warn!("{:?} failed to run: {}", tool, err),
            }
        }
        Ok(false)
    }

    /// Run one build tool with its combined output forwarded line-by-line
    /// into the log as it arrives, so long builds stay observable.
    async fn run_tool(&self, tool: BuildTool, project_dir: &Path) -> Result<bool> {
        let program = tool.program(project_dir);

        #[cfg(unix)]
        if matches!(tool, BuildTool::GradleWrapper | BuildTool::MavenWrapper) {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755));
        }

        tracing::info!("running {:?} {}", program, tool.args().join(" "));
        let mut child = Command::new(&program)
            .args(tool.args())
            .current_dir(project_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, "build"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, "build"));
        }

        let timeout = Duration::from_secs(self.config.build.timeout_secs);
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Ok(status?.success()),
            Err(_) => {
                child.kill().await?;
                Err(crate::Error::BuildTimeout(self.config.build.timeout_secs))
            }
        }
    }

    /// Remote build via JitPack, with a size sanity check so an error page
    /// body is not installed as a jar.
    async fn build_remotely(&self, repo: &Repo, dest: &Path) -> Result<Option<PathBuf>> {
        let Some(candidate) =
            jitpack::resolve_repo(&self.client, repo, &self.config.build).await?
        else {
            return Ok(None);
        };

        let response = self.client.get(&candidate.url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response.bytes().await?;
        if (body.len() as u64) < jitpack::MIN_JAR_SIZE {
            tracing::warn!(
                "jitpack artifact for {}/{} is {} bytes, rejecting",
                repo.owner,
                repo.name,
                body.len()
            );
            return Ok(None);
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &body)?;
        Ok(Some(dest.to_path_buf()))
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, scope: &'static str) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::info!("[{}] {}", scope, line);
    }
}

fn unpack_snapshot(snapshot: &Path, dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(snapshot)?)?;
    archive.extract(dir)?;
    Ok(())
}

/// Codeload archives wrap the tree in a single `<repo>-<branch>/` folder.
fn project_root(source_dir: &Path) -> PathBuf {
    if let Ok(mut entries) = std::fs::read_dir(source_dir) {
        if let Some(Ok(first)) = entries.next() {
            if first.path().is_dir() && entries.next().is_none() {
                return first.path();
            }
        }
    }
    source_dir.to_path_buf()
}

/// The largest jar under the project tree, skipping companion artifacts.
pub fn find_largest_jar(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_build_output_jar(&e.file_name().to_string_lossy()))
        .max_by_key(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .map(|e| e.into_path())
}

fn stem_of(dest: &Path) -> String {
    dest.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plugin".to_string())
}
