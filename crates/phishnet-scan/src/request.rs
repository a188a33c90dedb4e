//! Attachments to be scored and their content hashes.

use phishnet_core::{Attachment, PhishnetError, Result};
use ring::digest::{Context, SHA256};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Buffer size for streaming file reads (64 KiB).
const BUF_SIZE: usize = 64 * 1024;

/// SHA-256 of raw bytes as lowercase hex
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(ring::digest::digest(&SHA256, data).as_ref())
}

/// One attachment to be scored.
///
/// The hash is computed once when the request is built and the content is
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    sha256: String,
    filename: String,
    content: Arc<[u8]>,
}

impl ScanRequest {
    /// Hash `content` and wrap it
    pub fn from_bytes(filename: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        let content = content.into();
        Self {
            sha256: sha256_hex(&content),
            filename: filename.into(),
            content,
        }
    }

    /// Build a request from an email attachment
    #[must_use]
    pub fn from_attachment(attachment: &Attachment) -> Self {
        Self::from_bytes(attachment.filename.clone(), attachment.content.as_slice())
    }

    /// Read a file, hashing it as it streams in
    pub async fn from_path(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| PhishnetError::io(&path_str, e))?;

        let mut context = Context::new(&SHA256);
        let mut content = Vec::new();
        let mut buf = vec![0u8; BUF_SIZE];

        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| PhishnetError::io(&path_str, e))?;
            if n == 0 {
                break;
            }
            context.update(&buf[..n]);
            content.extend_from_slice(&buf[..n]);
        }

        let filename = path
            .file_name()
            .map_or_else(|| path_str.clone(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            sha256: hex::encode(context.finish().as_ref()),
            filename,
            content: content.into(),
        })
    }

    /// 64-char lowercase hex SHA-256 of the content
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Attachment file name
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Raw content
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content length in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}
