//! Remote provisioning of the dispatch database file.
//!
//! One-shot: if the local file exists the fetch is skipped entirely. There is
//! no retry and no checksum; a failed transfer must surface as an error and
//! leave no partial file behind.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::FetchOptions;
use crate::error::{DashboardError, Result};

/// Ensure a local copy of the remote database exists at `path`.
///
/// Returns `true` when a download happened, `false` when the file was
/// already present.
pub async fn ensure_local_copy(path: &Path, url: &str, opts: &FetchOptions) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    info!("Downloading database from {}", url);

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = opts.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if opts.validate_status && !status.is_success() {
        return Err(DashboardError::FetchStatus {
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    // Write to a sibling temp path and rename once the body is on disk.
    let tmp = PathBuf::from(format!("{}.part", path.display()));
    tokio::fs::write(&tmp, &body).await?;
    tokio::fs::rename(&tmp, path).await?;

    info!("Downloaded {} bytes to {}", body.len(), path.display());
    Ok(true)
}
