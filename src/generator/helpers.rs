//! Generator utility functions
//!
//! This module provides common utility functions used by the generator,
//! including path expansion, HTTP fetching, and reading and writing the
//! documents the pipelines work on.

use std::io::{ErrorKind, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::get_version;

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs_home()
    {
        return path.replacen("~", &home, 1);
    }
    path.to_string()
}

/// Get home directory path
pub fn dirs_home() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

/// Whether `location` is an `http://` or `https://` URL rather than a path
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

// ============================================================================
// HTTP Utilities
// ============================================================================

/// Fetch text content from a URL
pub async fn fetch_text(url: &str) -> Result<String> {
    debug!("Fetching URL: {}", url);

    let client = reqwest::Client::builder()
        .user_agent(format!("clashforge/{}", get_version()))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch URL: {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("HTTP request failed with status {}: {}", status, url);
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from: {}", url))
}

// ============================================================================
// Reading
// ============================================================================

/// Read a document from a file path or URL
pub async fn read_text(location: &str) -> Result<String> {
    if is_remote(location) {
        return fetch_text(location).await;
    }

    let expanded = expand_tilde(location);
    tokio::fs::read_to_string(&expanded)
        .await
        .with_context(|| format!("Failed to read {}", expanded))
}

/// Like [`read_text`], but a local file that does not exist yields `None`
pub async fn read_text_if_exists(location: &str) -> Result<Option<String>> {
    if is_remote(location) {
        return fetch_text(location).await.map(Some);
    }

    let expanded = expand_tilde(location);
    match tokio::fs::read_to_string(&expanded).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist", expanded);
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", expanded)),
    }
}

/// Read standard input to EOF, prompting first when it is a terminal
pub async fn read_stdin() -> Result<String> {
    if std::io::stdin().is_terminal() {
        eprintln!("Paste vmess:// links, then press Ctrl-D (Ctrl-Z on Windows) to finish:");
    }

    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("Failed to read links from standard input")?;
    debug!("Read {} bytes from standard input", content.len());
    Ok(content)
}

// ============================================================================
// Writing
// ============================================================================

/// Write `content` to `path` in one call, creating parent directories as needed
pub async fn write_text(path: &str, content: &str) -> Result<PathBuf> {
    let path = PathBuf::from(expand_tilde(path));

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write config to {:?}", path))?;

    info!("Config written to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_expand_tilde_with_home() {
        if let Ok(home) = env::var("HOME") {
            let expanded = expand_tilde("~/test/path");
            assert!(expanded.starts_with(&home));
            assert!(expanded.ends_with("/test/path"));
            assert!(!expanded.contains('~'));
        }
    }

    #[test]
    fn test_expand_tilde_no_tilde() {
        assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
        assert_eq!(expand_tilde("./relative/path"), "./relative/path");
    }

    #[test]
    fn test_expand_tilde_tilde_in_middle() {
        let path = "/some/~/path";
        assert_eq!(expand_tilde(path), path);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/config.yaml"));
        assert!(is_remote("http://127.0.0.1:8080/c.yaml"));
        assert!(!is_remote("./config.yaml"));
        assert!(!is_remote("ftp://example.com/config.yaml"));
    }

    #[tokio::test]
    async fn test_read_text_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = read_text(path.to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[tokio::test]
    async fn test_read_text_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.yaml");
        let location = path.to_str().unwrap();

        assert!(read_text_if_exists(location).await.unwrap().is_none());

        std::fs::write(&path, "port: 7890\n").unwrap();
        assert_eq!(
            read_text_if_exists(location).await.unwrap().as_deref(),
            Some("port: 7890\n")
        );
    }

    #[tokio::test]
    async fn test_write_text_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.yaml");

        let written = write_text(path.to_str().unwrap(), "a: 1\n").await.unwrap();

        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\n");
    }
}
