//! Integration tests for the fetcher.
//!
//! Tests cover:
//! - Raw jar bodies written to the active directory byte-for-byte
//! - Zip bodies reduced to their usable jar entry
//! - Bodies delivered across many chunks assembled intact
//! - Non-success HTTP statuses reported as fetch failures
//!
//! A throwaway TCP listener stands in for the artifact host.

use plugin_updater::core::fetcher::{decide_destination, Fetcher};
use plugin_updater::models::config::Config;
use plugin_updater::sources::{build_client, ArtifactCandidate};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn test_config(root: &std::path::Path) -> Arc<Config> {
    let mut config = Config::default();
    config.plugins_dir = root.join("plugins");
    config.rollback.root = root.join("rollback");
    Arc::new(config)
}

/// Serve one HTTP response on an ephemeral port.
async fn serve_once(status_line: &str, body: Vec<u8>) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let head = format!(
        "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_line,
        body.len()
    );
    tokio::spawn(async move {
        if let Ok((mut sock, _)) = listener.accept().await {
            let mut buf = [0u8; 2048];
            let _ = sock.read(&mut buf).await;
            let _ = sock.write_all(head.as_bytes()).await;
            let _ = sock.write_all(&body).await;
            let _ = sock.shutdown().await;
        }
    });
    port
}

/// Serve one response whose body arrives in several delayed writes, so the
/// client sees multiple chunks rather than a single buffer.
async fn serve_once_in_pieces(body: Vec<u8>, piece: usize) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    tokio::spawn(async move {
        if let Ok((mut sock, _)) = listener.accept().await {
            let mut buf = [0u8; 2048];
            let _ = sock.read(&mut buf).await;
            let _ = sock.write_all(head.as_bytes()).await;
            for chunk in body.chunks(piece) {
                let _ = sock.write_all(chunk).await;
                let _ = sock.flush().await;
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            let _ = sock.shutdown().await;
        }
    });
    port
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

#[tokio::test]
async fn test_raw_jar_body_installed_unchanged() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let fetcher = Fetcher::new(build_client().unwrap(), config.clone());

    let body = b"\xCA\xFE\xBA\xBEplugin bytes".to_vec();
    let port = serve_once("HTTP/1.1 200 OK", body.clone()).await;

    let candidate = ArtifactCandidate::new(format!("http://127.0.0.1:{}/foo.jar", port));
    let installed = fetcher.download(&candidate, "essentials").await.unwrap();

    assert_eq!(installed, config.plugins_dir.join("essentials.jar"));
    assert_eq!(fs::read(&installed).unwrap(), body);
    // No temp file left behind.
    assert!(!config.plugins_dir.join("essentials.part.zip").exists());
}

#[tokio::test]
async fn test_zip_body_reduced_to_jar_entry() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let fetcher = Fetcher::new(build_client().unwrap(), config.clone());

    let body = zip_bytes(&[
        ("foo-sources.jar", b"src".as_slice()),
        ("libs/foo.jar", b"the plugin".as_slice()),
    ]);
    let port = serve_once("HTTP/1.1 200 OK", body).await;

    let candidate = ArtifactCandidate::new(format!("http://127.0.0.1:{}/artifact.zip", port));
    let installed = fetcher.download(&candidate, "foo").await.unwrap();

    assert_eq!(fs::read(&installed).unwrap(), b"the plugin");
}

#[tokio::test]
async fn test_large_body_streamed_across_chunks() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let fetcher = Fetcher::new(build_client().unwrap(), config.clone());

    // A body large enough to span many network reads.
    let body: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let port = serve_once_in_pieces(body.clone(), 16 * 1024).await;

    let candidate = ArtifactCandidate::new(format!("http://127.0.0.1:{}/big.jar", port));
    let installed = fetcher.download(&candidate, "big").await.unwrap();

    assert_eq!(fs::read(&installed).unwrap(), body);
    assert!(!config.plugins_dir.join("big.part.zip").exists());
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let fetcher = Fetcher::new(build_client().unwrap(), config);

    let port = serve_once("HTTP/1.1 404 Not Found", b"missing".to_vec()).await;
    let candidate = ArtifactCandidate::new(format!("http://127.0.0.1:{}/foo.jar", port));

    let err = fetcher.download(&candidate, "foo").await.unwrap_err();
    assert!(matches!(err, plugin_updater::Error::DownloadStatus(404)));
}

#[test]
fn test_staging_directory_wins_when_it_holds_the_plugin() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let update_dir = config.update_dir();
    fs::create_dir_all(&update_dir).unwrap();
    fs::write(update_dir.join("Essentials-2.20.jar"), b"x").unwrap();

    assert_eq!(
        decide_destination(&config, "essentials"),
        update_dir.join("essentials.jar")
    );
    assert_eq!(
        decide_destination(&config, "chunky"),
        config.plugins_dir.join("chunky.jar")
    );
}
