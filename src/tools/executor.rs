//! Accumulates streamed tool-call arguments and executes finished calls.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::router::{ToolContext, ToolRouter};
use crate::provider::OutputItem;
use crate::types::{ExecutedToolCall, ToolOutcome};

/// Argument accumulator for one in-flight call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamedToolCall {
    pub id: String,
    pub name: String,
    pub argument_buffer: String,
    pub index: u32,
}

/// Per-step tool call state, keyed by provider output index.
///
/// Failures never escape [`ToolExecutor::finish`]: malformed arguments, router
/// errors and router panics all become `success: false` outcomes.
pub struct ToolExecutor {
    router: Arc<dyn ToolRouter>,
    open: HashMap<u32, StreamedToolCall>,
}

impl ToolExecutor {
    pub fn new(router: Arc<dyn ToolRouter>) -> Self {
        Self {
            router,
            open: HashMap::new(),
        }
    }

    /// Register an accumulator for a newly announced function-call item.
    ///
    /// Returns false for items that are not function calls.
    pub fn start(&mut self, index: u32, item: &OutputItem) -> bool {
        let OutputItem::FunctionCall {
            call_id,
            name,
            arguments,
            ..
        } = item
        else {
            return false;
        };
        if self.open.contains_key(&index) {
            warn!(index, call_id = %call_id, "duplicate tool call start ignored");
            return true;
        }
        self.open.insert(
            index,
            StreamedToolCall {
                id: call_id.clone(),
                name: name.clone(),
                argument_buffer: arguments.clone(),
                index,
            },
        );
        true
    }

    /// Append an argument fragment to the call at `index`.
    pub fn delta(&mut self, index: u32, fragment: &str) {
        match self.open.get_mut(&index) {
            Some(call) => call.argument_buffer.push_str(fragment),
            None => warn!(index, "tool call delta for unknown index ignored"),
        }
    }

    /// Current buffer for `index`, if open.
    pub fn buffer(&self, index: u32) -> Option<&str> {
        self.open.get(&index).map(|c| c.argument_buffer.as_str())
    }

    pub fn open_calls(&self) -> usize {
        self.open.len()
    }

    /// Close the call at `index`, parse its arguments and run it.
    ///
    /// Returns `None` when `item` is not a function call.
    pub async fn finish(
        &mut self,
        index: u32,
        item: &OutputItem,
        ctx: &ToolContext,
    ) -> Option<ExecutedToolCall> {
        let OutputItem::FunctionCall {
            call_id,
            name,
            arguments,
            ..
        } = item
        else {
            return None;
        };

        let accumulated = match self.open.remove(&index) {
            Some(call) => call,
            None => {
                warn!(index, call_id = %call_id, "tool call finished without start");
                StreamedToolCall {
                    id: call_id.clone(),
                    name: name.clone(),
                    argument_buffer: String::new(),
                    index,
                }
            }
        };

        let raw = if accumulated.argument_buffer.trim().is_empty() {
            arguments.as_str()
        } else {
            accumulated.argument_buffer.as_str()
        };
        let id = if call_id.is_empty() {
            accumulated.id.clone()
        } else {
            call_id.clone()
        };
        let name = if name.is_empty() {
            accumulated.name.clone()
        } else {
            name.clone()
        };

        let args = match ToolArguments::parse(raw) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %name, call_id = %id, error = %e, "tool arguments failed to parse");
                return Some(ExecutedToolCall {
                    id,
                    name: name.clone(),
                    parsed_arguments: serde_json::Value::Null,
                    result: ToolOutcome::failure(format!(
                        "Invalid JSON arguments for tool '{name}': {e}"
                    )),
                });
            }
        };

        let mut call_ctx = ctx.clone();
        call_ctx.call_id = Some(id.clone());
        let router = self.router.clone();
        let run = AssertUnwindSafe(router.execute(&name, &args, &call_ctx))
            .catch_unwind()
            .await;
        let result = match run {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(tool = %name, call_id = %id, error = %e, "tool execution failed");
                ToolOutcome::failure(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = %name, call_id = %id, %message, "tool panicked");
                ToolOutcome::failure(format!("Tool '{name}' panicked: {message}"))
            }
        };
        debug!(tool = %name, call_id = %id, success = result.success, "tool call finished");

        Some(ExecutedToolCall {
            id,
            name,
            parsed_arguments: args.into_inner(),
            result,
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
