//! Local staging of uploaded files.
//!
//! An upload is written to `{staging_dir}/{key}` before it is forwarded to the
//! object store. The file is owned by a [`StagedFile`], which deletes it when
//! removed explicitly or when dropped, so an early return or a failed store
//! call cannot leave it behind.

use crate::utils::keys::{generate_short_id, sanitize_filename, storage_key};
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::Path;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Bytes kept from the start of the upload for content type sniffing.
const SNIFF_LEN: usize = 8192;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("Malformed upload body: {0}")]
    Multipart(String),
}

#[derive(Debug)]
pub struct StagedFile {
    pub id: String,
    /// Upload time, milliseconds since the epoch
    pub timestamp: i64,
    pub original_name: String,
    pub key: String,
    pub content_type: String,
    pub size: u64,
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the local file now. Dropping has the same effect but cannot
    /// report failures.
    pub fn remove(self) {
        let key = self.key;
        if let Err(e) = self.path.close() {
            tracing::warn!("Failed to remove staged file {}: {}", key, e);
        } else {
            tracing::debug!("Removed staged file {}", key);
        }
    }
}

/// Write `chunks` into the staging directory under a freshly generated key.
pub async fn stage_upload<S, E>(
    staging_dir: &Path,
    original_name: &str,
    declared_type: Option<&str>,
    mut chunks: S,
    max_size: usize,
) -> Result<StagedFile, StagingError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let id = generate_short_id();
    let timestamp = Utc::now().timestamp_millis();
    let filename = sanitize_filename(original_name);
    let key = storage_key(&id, timestamp, &filename);

    let (file, path) = tempfile::Builder::new()
        .prefix(&key)
        .rand_bytes(0)
        .tempfile_in(staging_dir)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size: u64 = 0;
    let mut head = Vec::with_capacity(SNIFF_LEN);

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| StagingError::Multipart(e.to_string()))?;

        size += chunk.len() as u64;
        if size > max_size as u64 {
            return Err(StagingError::TooLarge(max_size));
        }

        if head.len() < SNIFF_LEN {
            let take = (SNIFF_LEN - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }

        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    let content_type = resolve_content_type(declared_type, &head);
    tracing::info!(
        "Staged {} ({} bytes, {}) as {}",
        original_name,
        size,
        content_type,
        key
    );

    Ok(StagedFile {
        id,
        timestamp,
        original_name: original_name.to_string(),
        key,
        content_type,
        size,
        path,
    })
}

/// Declared type if it parses, else sniffed from magic bytes, else
/// `application/octet-stream`.
pub fn resolve_content_type(declared: Option<&str>, head: &[u8]) -> String {
    declared
        .and_then(|d| d.parse::<mime::Mime>().ok())
        .map(|m| m.to_string())
        .or_else(|| infer::get(head).map(|t| t.mime_type().to_string()))
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}
