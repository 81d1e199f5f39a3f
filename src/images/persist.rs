//! Turn decoded image bytes into stored, referenceable images.

use std::sync::Arc;

use super::store::BlobStore;
use crate::error::BrookError;
use crate::types::StoredImage;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_MAGIC: &[u8] = b"GIF8";

/// Resolve the MIME type: declared format first, then magic bytes, then PNG.
pub fn resolve_image_type(declared_format: Option<&str>, bytes: &[u8]) -> &'static str {
    let declared = declared_format.map(|f| f.trim().to_ascii_lowercase());
    match declared.as_deref() {
        Some("png") | Some("image/png") => return "image/png",
        Some("jpeg") | Some("jpg") | Some("image/jpeg") => return "image/jpeg",
        Some("webp") | Some("image/webp") => return "image/webp",
        Some("gif") | Some("image/gif") => return "image/gif",
        _ => {}
    }
    if bytes.starts_with(PNG_MAGIC) {
        "image/png"
    } else if bytes.starts_with(JPEG_MAGIC) {
        "image/jpeg"
    } else if bytes.starts_with(GIF_MAGIC) {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

/// Writes completed images through a [`BlobStore`].
#[derive(Clone)]
pub struct ImagePersister {
    store: Arc<dyn BlobStore>,
}

impl ImagePersister {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Persist `bytes` and build the markdown reference.
    pub async fn persist(
        &self,
        bytes: &[u8],
        declared_format: Option<&str>,
    ) -> Result<StoredImage, BrookError> {
        if bytes.is_empty() {
            return Err(BrookError::Storage("refusing to store an empty image".into()));
        }
        let mime_type = resolve_image_type(declared_format, bytes);
        let saved = self.store.save(bytes, mime_type).await?;
        let markdown = format!("![generated image]({})", saved.url);
        Ok(StoredImage {
            url: saved.url,
            storage_path: saved.storage_path,
            format: saved.format,
            markdown,
        })
    }
}
