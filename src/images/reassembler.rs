//! Index-keyed base64 chunk buffers.

use std::collections::HashMap;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;

use crate::error::BrookError;

/// Accumulates base64 fragments per output index.
///
/// Buffers are created on first write and removed by [`finalize`] or
/// [`discard`], so memory is bounded by the images currently in flight.
///
/// [`finalize`]: ImageReassembler::finalize
/// [`discard`]: ImageReassembler::discard
#[derive(Debug, Default)]
pub struct ImageReassembler {
    buffers: HashMap<u32, String>,
}

impl ImageReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate `chunk` onto the buffer for `index`.
    pub fn append(&mut self, index: u32, chunk: &str) {
        self.buffers.entry(index).or_default().push_str(chunk);
    }

    /// Replace the buffer for `index` with a whole blob (legacy preview shape).
    pub fn replace(&mut self, index: u32, blob: &str) {
        self.buffers.insert(index, blob.to_string());
    }

    /// Decode and remove the buffer for `index`; `Ok(None)` if there is none.
    pub fn finalize(&mut self, index: u32) -> Result<Option<Vec<u8>>, BrookError> {
        let Some(encoded) = self.buffers.remove(&index) else {
            return Ok(None);
        };
        decode_base64(&encoded)
            .map(Some)
            .map_err(|message| BrookError::ImageDecode { index, message })
    }

    /// Drop the buffer for `index` without decoding it.
    pub fn discard(&mut self, index: u32) -> bool {
        self.buffers.remove(&index).is_some()
    }

    /// Number of indices with buffered data.
    pub fn pending(&self) -> usize {
        self.buffers.len()
    }
}

/// Decode a base64 payload, tolerating whitespace, missing padding and a
/// `data:` URL prefix.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, String> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
        .map_err(|e| e.to_string())
}
