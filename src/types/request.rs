//! Provider request types.

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::effort::{BuiltInTool, ReasoningEffort};

/// Role of a conversational input message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
}

/// One item of provider input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message { role: Role, content: String },
    /// Result of a custom tool call, fed back on the next step.
    FunctionCallOutput { call_id: String, output: String },
}

impl InputItem {
    pub fn user(text: impl Into<String>) -> Self {
        Self::Message {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::Message {
            role: Role::System,
            content: text.into(),
        }
    }
}

/// Definition of an application-routed function tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A tool offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolSpec {
    Function(FunctionTool),
    BuiltIn(BuiltInTool),
}

impl ToolSpec {
    /// Name the provider and the policy table know this tool by.
    pub fn name(&self) -> String {
        match self {
            Self::Function(f) => f.name.clone(),
            Self::BuiltIn(tool) => tool.to_string(),
        }
    }

    /// Responses API wire form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Function(f) => serde_json::json!({
                "type": "function",
                "name": f.name,
                "description": f.description,
                "parameters": f.parameters,
                "strict": false,
            }),
            Self::BuiltIn(tool) => serde_json::json!({ "type": tool.to_string() }),
        }
    }
}

impl From<BuiltInTool> for ToolSpec {
    fn from(tool: BuiltInTool) -> Self {
        Self::BuiltIn(tool)
    }
}

impl From<FunctionTool> for ToolSpec {
    fn from(tool: FunctionTool) -> Self {
        Self::Function(tool)
    }
}

/// A single streaming request to the model provider.
///
/// ```
/// use brook::types::{BuiltInTool, InputItem, ReasoningEffort, ResponseRequest};
///
/// let request = ResponseRequest::builder()
///     .model("gpt-5")
///     .input(vec![InputItem::user("draw a heron")])
///     .tools(vec![BuiltInTool::ImageGeneration.into()])
///     .reasoning_effort(ReasoningEffort::Low)
///     .build();
/// assert_eq!(request.built_in_tools(), vec![BuiltInTool::ImageGeneration]);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ResponseRequest {
    #[builder(into)]
    pub model: String,
    #[builder(into)]
    pub instructions: Option<String>,
    #[builder(default)]
    pub input: Vec<InputItem>,
    #[builder(default)]
    pub tools: Vec<ToolSpec>,
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Continuation token from the previous step.
    #[builder(into)]
    pub previous_response_id: Option<String>,
}

impl ResponseRequest {
    /// Built-in tools requested, in declaration order.
    pub fn built_in_tools(&self) -> Vec<BuiltInTool> {
        self.tools
            .iter()
            .filter_map(|t| match t {
                ToolSpec::BuiltIn(tool) => Some(*tool),
                ToolSpec::Function(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_call_output_serializes_with_type_tag() {
        let item = InputItem::FunctionCallOutput {
            call_id: "call_1".to_string(),
            output: "{\"ok\":true}".to_string(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "function_call_output");
        assert_eq!(value["call_id"], "call_1");

        let message = serde_json::to_value(InputItem::user("hi")).unwrap();
        assert_eq!(message["type"], "message");
        assert_eq!(message["role"], "user");
    }

    #[test]
    fn built_in_tool_wire_form_is_bare_type() {
        let spec = ToolSpec::from(BuiltInTool::WebSearch);
        assert_eq!(spec.to_json(), serde_json::json!({"type": "web_search"}));
        assert_eq!(spec.name(), "web_search");
    }
}
