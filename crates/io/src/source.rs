//! Acquisition of the raw case table from a URL or a local file.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::IoError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Returns `true` when `source` names an `http://` or `https://` resource.
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads the raw table bytes from `source`.
///
/// Remote sources are downloaded with a blocking HTTP client; anything
/// else is treated as a filesystem path.
///
/// # Errors
///
/// | Condition | Variant |
/// |-----------|---------|
/// | local path does not exist | [`IoError::FileNotFound`] |
/// | local read fails | [`IoError::Io`] |
/// | request fails or returns a non-success status | [`IoError::Http`] |
pub fn fetch_source(source: &str) -> Result<Vec<u8>, IoError> {
    if is_remote(source) {
        download(source.trim())
    } else {
        read_file(Path::new(source))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| IoError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read raw table");
    Ok(bytes)
}

fn download(url: &str) -> Result<Vec<u8>, IoError> {
    let http_err = |e: reqwest::Error| IoError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    };

    info!(url, "downloading raw table");
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(http_err)?;
    let bytes = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(http_err)?;
    debug!(url, bytes = bytes.len(), "download complete");
    Ok(bytes.to_vec())
}
