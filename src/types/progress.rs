//! Progress events pushed to the client while a step streams.

use serde::{Deserialize, Serialize};

/// Terminal status of a custom tool call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Client-facing progress event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    ResponseCreated {
        id: String,
    },
    /// Only the increment, never the accumulated text.
    Delta {
        delta: String,
    },
    TextDone {
        text: String,
    },
    /// Image preview data for output `index`.
    ///
    /// Legacy whole-blob events carry a complete, decodable preview each time.
    /// Chunked `output_image.delta` events carry one base64 fragment only:
    /// clients concatenate fragments per `index` in arrival order before
    /// decoding, and the final image arrives as an `image` event.
    PartialImage {
        b64: String,
        index: u32,
    },
    Image {
        url: String,
        #[serde(rename = "storagePath")]
        storage_path: String,
        format: String,
    },
    Error {
        error: String,
    },
    FunctionResult {
        name: String,
        status: ToolStatus,
        result: serde_json::Value,
    },
}

impl ProgressEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Render as a server-sent-events frame.
    pub fn to_sse_frame(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "error": e.to_string() }).to_string()
        });
        format!("data: {data}\n\n")
    }
}
