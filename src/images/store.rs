//! Blob storage capability for generated images.

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::BrookError;

/// Where a blob ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBlob {
    /// Durable URL clients can fetch.
    pub url: String,
    /// Store-relative path, for message persistence.
    pub storage_path: String,
    /// Short format name (`png`, `jpeg`, ..).
    pub format: String,
}

/// Durable storage for image bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save(&self, bytes: &[u8], mime_type: &str) -> Result<SavedBlob, BrookError>;
}

/// Content-addressed filesystem store.
///
/// Files live at `<root>/<hh>/<sha256>.<ext>`; saving identical bytes twice
/// yields the same path and URL.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// File extension for an image MIME type.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpeg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn save(&self, bytes: &[u8], mime_type: &str) -> Result<SavedBlob, BrookError> {
        let ext = extension_for_mime(mime_type).ok_or_else(|| {
            BrookError::Storage(format!("unsupported image type '{mime_type}'"))
        })?;
        let digest = format!("{:x}", Sha256::digest(bytes));
        let storage_path = format!("{}/{}.{}", &digest[..2], digest, ext);
        let path = self.root.join(&storage_path);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(storage_path = %storage_path, "image already stored");
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BrookError::Storage(format!("create {}: {e}", parent.display())))?;
            }
            // One temp file per write; overlapping saves of the same digest only meet at rename.
            let tmp = path.with_extension(format!("{ext}.{}.tmp", uuid::Uuid::new_v4().simple()));
            tokio::fs::write(&tmp, bytes)
                .await
                .map_err(|e| BrookError::Storage(format!("write {}: {e}", tmp.display())))?;
            if let Err(e) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    return Err(BrookError::Storage(format!(
                        "rename {}: {e}",
                        path.display()
                    )));
                }
                tracing::debug!(storage_path = %storage_path, "image stored by a concurrent writer");
            }
        }

        Ok(SavedBlob {
            url: format!("{}/{}", self.base_url, storage_path),
            storage_path,
            format: ext.to_string(),
        })
    }
}
