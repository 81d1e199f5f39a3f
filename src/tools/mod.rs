//! Custom tool calling: accumulation, routing and execution.

pub mod arguments;
pub mod executor;
pub mod router;
pub mod tool;
pub mod validation;

pub use arguments::ToolArguments;
pub use executor::{StreamedToolCall, ToolExecutor};
pub use router::{ToolContext, ToolRegistry, ToolRouter};
pub use tool::{FnTool, Tool};
