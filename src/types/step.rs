//! Per-step result types.

use serde::{Deserialize, Serialize};

use super::progress::ToolStatus;
use super::request::InputItem;

/// Outcome reported by a tool router.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn status(&self) -> ToolStatus {
        if self.success {
            ToolStatus::Success
        } else {
            ToolStatus::Error
        }
    }

    /// The output on success, `{"error": ..}` otherwise.
    pub fn payload(&self) -> serde_json::Value {
        if self.success {
            self.output.clone().unwrap_or(serde_json::Value::Null)
        } else {
            serde_json::json!({ "error": self.error.clone().unwrap_or_default() })
        }
    }
}

/// A custom tool call whose arguments completed and which has been executed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutedToolCall {
    pub id: String,
    pub name: String,
    /// `Null` when the arguments failed to parse.
    pub parsed_arguments: serde_json::Value,
    pub result: ToolOutcome,
}

impl ExecutedToolCall {
    /// Input item carrying this result back to the model.
    pub fn to_input_item(&self) -> InputItem {
        let output = serde_json::to_string(&self.result)
            .unwrap_or_else(|_| "{\"success\":false}".to_string());
        InputItem::FunctionCallOutput {
            call_id: self.id.clone(),
            output,
        }
    }
}

/// A persisted, completed image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    pub storage_path: String,
    pub format: String,
    pub markdown: String,
}

/// Aggregated result of one provider stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamStepResult {
    pub text: String,
    pub response_id: String,
    pub tool_calls: Vec<ExecutedToolCall>,
    pub images: Vec<StoredImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_payload_carries_error() {
        let outcome = ToolOutcome::failure("bad args");
        assert_eq!(outcome.status(), ToolStatus::Error);
        assert_eq!(outcome.payload(), serde_json::json!({"error": "bad args"}));
        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire, serde_json::json!({"success": false, "error": "bad args"}));
    }

    #[test]
    fn executed_call_feeds_back_as_function_call_output() {
        let call = ExecutedToolCall {
            id: "call_9".to_string(),
            name: "lookup".to_string(),
            parsed_arguments: serde_json::json!({"q": "x"}),
            result: ToolOutcome::ok(serde_json::json!({"hits": 2})),
        };
        match call.to_input_item() {
            InputItem::FunctionCallOutput { call_id, output } => {
                assert_eq!(call_id, "call_9");
                let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
                assert_eq!(parsed["success"], true);
                assert_eq!(parsed["output"]["hits"], 2);
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }
}
