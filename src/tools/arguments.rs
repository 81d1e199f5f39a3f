//! Typed access to parsed tool call arguments.

use crate::error::BrookError;

/// Parsed arguments of a custom tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse an accumulated argument payload; an empty payload is `{}`.
    pub fn parse(raw: &str) -> Result<Self, BrookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        serde_json::from_str(trimmed).map(Self::new).map_err(BrookError::from)
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, BrookError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrookError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, BrookError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| BrookError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, BrookError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| BrookError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Deserialize the arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, BrookError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            BrookError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
