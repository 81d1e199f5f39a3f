//! Provider stream events as a closed sum type.
//!
//! Payloads are parsed leniently: a known event type whose fields do not
//! match is downgraded to [`ProviderEvent::Unknown`] rather than failing the
//! step.

use serde::Deserialize;
use tracing::warn;

/// An item announced or completed by `response.output_item.*`.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    FunctionCall {
        id: Option<String>,
        call_id: String,
        name: String,
        arguments: String,
    },
    /// Built-in image generation; `result` carries the whole base64 image.
    ImageGenerationCall {
        id: Option<String>,
        result: Option<String>,
        output_format: Option<String>,
    },
    Message {
        id: Option<String>,
    },
    Other {
        item_type: String,
    },
}

impl OutputItem {
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        let item_type = value.get("type")?.as_str()?;
        match item_type {
            "function_call" => {
                let item: FunctionCallWire = serde_json::from_value(value.clone()).ok()?;
                let call_id = item.call_id.or_else(|| item.id.clone())?;
                Some(Self::FunctionCall {
                    id: item.id,
                    call_id,
                    name: item.name,
                    arguments: item.arguments.unwrap_or_default(),
                })
            }
            "image_generation_call" => {
                let item: ImageGenerationWire = serde_json::from_value(value.clone()).ok()?;
                Some(Self::ImageGenerationCall {
                    id: item.id,
                    result: item.result.filter(|r| !r.is_empty()),
                    output_format: item.output_format,
                })
            }
            "message" => Some(Self::Message {
                id: value.get("id").and_then(|v| v.as_str()).map(str::to_string),
            }),
            other => Some(Self::Other {
                item_type: other.to_string(),
            }),
        }
    }
}

/// One event of the provider's response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Created {
        response_id: String,
    },
    TextDelta {
        delta: String,
    },
    TextDone {
        text: Option<String>,
    },
    /// Legacy shape: a whole base64 preview per event.
    PartialImage {
        index: u32,
        b64: String,
    },
    /// Chunked shape: an incremental base64 fragment for `index`.
    OutputImageDelta {
        index: u32,
        delta: String,
    },
    /// Built-in image generation finished; `b64` is the whole image when present.
    ImageGenerationCompleted {
        index: u32,
        b64: Option<String>,
        output_format: Option<String>,
    },
    /// Finalizes a previously chunked `index`.
    OutputImageCompleted {
        index: u32,
        output_format: Option<String>,
    },
    OutputItemAdded {
        index: u32,
        item: OutputItem,
    },
    ToolCallDelta {
        index: u32,
        delta: String,
    },
    OutputItemDone {
        index: u32,
        item: OutputItem,
    },
    Completed {
        response_id: String,
    },
    Failed {
        message: String,
        code: Option<String>,
    },
    Unknown {
        event_type: String,
        raw: serde_json::Value,
    },
}

impl ProviderEvent {
    /// Parse one decoded SSE payload.
    pub fn from_json(value: serde_json::Value) -> Self {
        let event_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();
        match Self::parse_known(&event_type, &value) {
            Some(event) => event,
            None => {
                if is_known_type(&event_type) {
                    warn!(event_type = %event_type, "malformed provider event ignored");
                }
                Self::Unknown {
                    event_type,
                    raw: value,
                }
            }
        }
    }

    /// Parse a raw SSE `data:` payload.
    pub fn from_str_payload(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<serde_json::Value>(data).map(Self::from_json)
    }

    fn parse_known(event_type: &str, value: &serde_json::Value) -> Option<Self> {
        let event = match event_type {
            "response.created" => Self::Created {
                response_id: response_id(value)?,
            },
            "response.output_text.delta" => Self::TextDelta {
                delta: str_field(value, "delta")?,
            },
            "response.output_text.done" => Self::TextDone {
                text: str_field(value, "text"),
            },
            "response.image_generation_call.partial_image" => Self::PartialImage {
                index: index_field(value),
                b64: str_field(value, "partial_image_b64").or_else(|| str_field(value, "b64"))?,
            },
            "response.output_image.delta" => Self::OutputImageDelta {
                index: index_field(value),
                delta: str_field(value, "delta")?,
            },
            "response.image_generation.completed"
            | "response.image_generation_call.completed" => Self::ImageGenerationCompleted {
                index: index_field(value),
                b64: ["result", "b64_json", "image_b64"]
                    .iter()
                    .find_map(|key| str_field(value, key))
                    .filter(|b64| !b64.is_empty()),
                output_format: str_field(value, "output_format"),
            },
            "response.output_image.completed" => Self::OutputImageCompleted {
                index: index_field(value),
                output_format: str_field(value, "output_format")
                    .or_else(|| str_field(value, "format")),
            },
            "response.output_item.added" => Self::OutputItemAdded {
                index: index_field(value),
                item: OutputItem::from_json(value.get("item")?)?,
            },
            "response.function_call_arguments.delta" | "response.tool_call.delta" => {
                Self::ToolCallDelta {
                    index: index_field(value),
                    delta: str_field(value, "delta")?,
                }
            }
            "response.output_item.done" => Self::OutputItemDone {
                index: index_field(value),
                item: OutputItem::from_json(value.get("item")?)?,
            },
            "response.completed" => Self::Completed {
                response_id: response_id(value)?,
            },
            "response.failed" => {
                let error: Option<ErrorWire> = value
                    .get("response")
                    .and_then(|r| r.get("error"))
                    .and_then(|e| serde_json::from_value(e.clone()).ok());
                Self::Failed {
                    message: error
                        .as_ref()
                        .and_then(|e| e.message.clone())
                        .unwrap_or_else(|| "response failed".to_string()),
                    code: error.and_then(|e| e.code),
                }
            }
            "error" => {
                let error: ErrorWire = serde_json::from_value(value.clone()).ok()?;
                Self::Failed {
                    message: error
                        .message
                        .unwrap_or_else(|| "provider stream error".to_string()),
                    code: error.code,
                }
            }
            _ => return None,
        };
        Some(event)
    }
}

fn is_known_type(event_type: &str) -> bool {
    matches!(
        event_type,
        "response.created"
            | "response.output_text.delta"
            | "response.output_text.done"
            | "response.image_generation_call.partial_image"
            | "response.output_image.delta"
            | "response.image_generation.completed"
            | "response.image_generation_call.completed"
            | "response.output_image.completed"
            | "response.output_item.added"
            | "response.function_call_arguments.delta"
            | "response.tool_call.delta"
            | "response.output_item.done"
            | "response.completed"
            | "response.failed"
            | "error"
    )
}

fn str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn index_field(value: &serde_json::Value) -> u32 {
    value
        .get("output_index")
        .or_else(|| value.get("index"))
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn response_id(value: &serde_json::Value) -> Option<String> {
    value
        .get("response")
        .and_then(|r| r.get("id"))
        .or_else(|| value.get("response_id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[derive(Deserialize)]
struct FunctionCallWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct ImageGenerationWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    output_format: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWire {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
