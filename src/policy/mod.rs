//! Reasoning-effort / built-in-tool compatibility policy.
//!
//! The provider rejects some effort and tool combinations with opaque errors,
//! so every request passes through [`decide`] before it is sent.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BrookError, Result};
use crate::types::{BuiltInTool, ReasoningEffort};

const ALL_BUILT_IN: &[BuiltInTool] = &[
    BuiltInTool::ImageGeneration,
    BuiltInTool::WebSearch,
    BuiltInTool::FileSearch,
    BuiltInTool::CodeInterpreter,
];

/// Result of a compatibility check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatibilityDecision {
    pub effort: ReasoningEffort,
    pub tools: Vec<BuiltInTool>,
    /// True when the effort was raised to satisfy the tools.
    pub coerced: bool,
}

/// Built-in tools the provider accepts at `effort`.
pub fn allowed_tools(effort: ReasoningEffort) -> &'static [BuiltInTool] {
    match effort {
        ReasoningEffort::Minimal => &[],
        ReasoningEffort::Low | ReasoningEffort::Medium | ReasoningEffort::High => ALL_BUILT_IN,
    }
}

/// Lowest effort that allows every tool in `tools`, if any level does.
pub fn minimum_effort_for(tools: &[BuiltInTool]) -> Option<ReasoningEffort> {
    ReasoningEffort::ALL
        .into_iter()
        .find(|effort| tools.iter().all(|t| allowed_tools(*effort).contains(t)))
}

/// Validate `effort` against `tools`.
///
/// In strict mode an unsupported combination is a [`BrookError::PolicyViolation`];
/// otherwise the effort is raised to the lowest level that supports every tool.
pub fn decide(
    effort: ReasoningEffort,
    tools: &[BuiltInTool],
    strict: bool,
) -> Result<CompatibilityDecision> {
    let allowed = allowed_tools(effort);
    let blocked: Vec<BuiltInTool> = tools
        .iter()
        .copied()
        .filter(|t| !allowed.contains(t))
        .collect();

    if blocked.is_empty() {
        return Ok(CompatibilityDecision {
            effort,
            tools: tools.to_vec(),
            coerced: false,
        });
    }

    let minimum = minimum_effort_for(tools).ok_or_else(|| {
        BrookError::InvalidArgument(format!(
            "no reasoning effort supports tools {:?}",
            tools
        ))
    })?;

    if strict {
        return Err(BrookError::PolicyViolation {
            effort,
            blocked: blocked.iter().map(|t| t.to_string()).collect(),
            minimum,
        });
    }

    warn!(
        requested = %effort,
        coerced_to = %minimum,
        blocked = ?blocked,
        "raising reasoning effort for requested built-in tools"
    );
    Ok(CompatibilityDecision {
        effort: minimum,
        tools: tools.to_vec(),
        coerced: true,
    })
}
