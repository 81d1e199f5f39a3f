//! Convenience re-exports for common use.

pub use crate::config::BrookConfig;
pub use crate::error::{BrookError, Result};
pub use crate::images::{BlobStore, FsBlobStore, SavedBlob};
pub use crate::orchestrator::{Orchestrator, TurnOutcome};
pub use crate::policy::CompatibilityDecision;
pub use crate::provider::{ProviderEvent, ResponseProvider};
pub use crate::stream::{ChannelEmitter, SseEmitter, StreamRunner};
pub use crate::tools::{FnTool, Tool, ToolArguments, ToolContext, ToolRegistry, ToolRouter};
pub use crate::types::{
    BuiltInTool, ExecutedToolCall, InputItem, ProgressEvent, ReasoningEffort, ResponseRequest,
    StoredImage, StreamStepResult, ToolOutcome, ToolSpec,
};
pub use tokio_util::sync::CancellationToken;
