//! Error types for the plugin updater.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the plugin updater.
#[derive(Error, Debug)]
pub enum Error {
    // Locator errors
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Invalid artifact index in locator: {0}")]
    InvalidArtifactIndex(String),

    // Resolution errors
    #[error("No artifact found for: {0}")]
    ArtifactNotFound(String),

    #[error("Unexpected response from {api}: {reason}")]
    ApiResponse { api: &'static str, reason: String },

    // Fetch errors
    #[error("Download failed with HTTP status {0}")]
    DownloadStatus(u16),

    #[error("Archive contains no usable jar: {0}")]
    NoJarInArchive(String),

    // List file errors
    #[error("Plugin list entry not found: {0}")]
    EntryNotFound(String),

    #[error("Duplicate plugin list entry: {0}")]
    DuplicateEntry(String),

    #[error("Malformed plugin list line {line}: {content}")]
    MalformedListLine { line: usize, content: String },

    // Build errors
    #[error("No build tool available for {0}")]
    NoBuildTool(String),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Build timed out after {0} seconds")]
    BuildTimeout(u64),

    // Rollback errors
    #[error("No backup recorded for: {0}")]
    NoBackup(String),

    #[error("Restore failed for {plugin}: {reason}")]
    RestoreFailed { plugin: String, reason: String },

    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    // Batch errors
    #[error("An update batch is already running")]
    UpdateInProgress,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Archive errors
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
