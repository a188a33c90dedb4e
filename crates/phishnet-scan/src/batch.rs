//! Batch scanning of files on disk.

use phishnet_core::{AttachmentScan, PhishnetError, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::orchestrator::ScanOrchestrator;
use crate::request::ScanRequest;

/// Expand a target into the files to scan.
///
/// A file yields itself; a directory yields its regular files (not
/// recursive), sorted by path.
pub async fn collect_files(target: &Path) -> Result<Vec<PathBuf>> {
    let target_str = target.display().to_string();
    let metadata = tokio::fs::metadata(target)
        .await
        .map_err(|e| PhishnetError::io(&target_str, e))?;

    if metadata.is_file() {
        return Ok(vec![target.to_path_buf()]);
    }

    if !metadata.is_dir() {
        return Err(PhishnetError::InvalidInput(format!(
            "{target_str} is neither a file nor a directory"
        )));
    }

    let mut entries = tokio::fs::read_dir(target)
        .await
        .map_err(|e| PhishnetError::io(&target_str, e))?;
    let mut files = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PhishnetError::io(&target_str, e))?
    {
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Read, hash and scan every path concurrently
pub async fn scan_paths(
    scanner: &ScanOrchestrator,
    paths: &[PathBuf],
    cancel: &CancellationToken,
) -> Result<Vec<AttachmentScan>> {
    let mut requests = Vec::with_capacity(paths.len());
    for path in paths {
        requests.push(ScanRequest::from_path(path).await?);
    }

    info!(
        files = requests.len(),
        concurrency = scanner.gate().max(),
        "starting batch scan"
    );

    Ok(scanner.scan_all(&requests, cancel).await)
}

/// Collect and scan everything under `target`
pub async fn scan_target(
    scanner: &ScanOrchestrator,
    target: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<AttachmentScan>> {
    let files = collect_files(target).await?;
    scan_paths(scanner, &files, cancel).await
}
