//! Tool routing: the capability the executor dispatches finished calls to.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::Tool;
use super::validation::validate_arguments;
use crate::error::BrookError;
use crate::types::{ToolOutcome, ToolSpec};

/// Caller identity passed through to tools; opaque to the stream core.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub session_id: String,
    pub user_id: Option<String>,
    /// Set per call by the executor.
    pub call_id: Option<String>,
    /// Response id of the step that produced the call, when known.
    pub response_id: Option<String>,
    pub metadata: serde_json::Value,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Executes custom tool calls by name.
///
/// Returning `Err` is allowed; the executor converts it into a failed
/// [`ToolOutcome`] so the model sees the failure as an ordinary result.
#[async_trait]
pub trait ToolRouter: Send + Sync {
    async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, BrookError>;
}

/// A [`ToolRouter`] over a set of named [`Tool`]s.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function tool definitions, sorted by name for stable requests.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs.into_iter().map(ToolSpec::Function).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[async_trait]
impl ToolRouter for ToolRegistry {
    async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, BrookError> {
        let Some(tool) = self.tools.get(name) else {
            return Ok(ToolOutcome::failure(format!("Tool '{name}' not found")));
        };
        if let Err(message) = validate_arguments(args.raw(), tool.parameters()) {
            debug!(tool = name, %message, "tool arguments rejected by schema");
            return Ok(ToolOutcome::failure(format!(
                "Invalid arguments for tool '{name}': {message}"
            )));
        }
        let output = tool.execute(args, ctx).await?;
        Ok(ToolOutcome::ok(output))
    }
}
