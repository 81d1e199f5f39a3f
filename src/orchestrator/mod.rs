//! Multi-step turn orchestration: policy check, tool round-trips, aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BrookConfig;
use crate::error::{BrookError, Result};
use crate::policy::{self, CompatibilityDecision};
use crate::stream::{SseEmitter, StreamRunner};
use crate::tools::ToolContext;
use crate::types::{InputItem, ProgressEvent, ResponseRequest, StoredImage, StreamStepResult};

/// Default cap on provider calls per turn.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Aggregated result of one turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// Id of the last step's response.
    pub response_id: String,
    /// Non-empty step texts joined by blank lines.
    pub text: String,
    pub images: Vec<StoredImage>,
    pub steps: Vec<StreamStepResult>,
    pub rounds: usize,
    /// The last step still requested tools when the cap was hit.
    pub round_limit_reached: bool,
    /// `None` when the request carried no reasoning effort.
    pub decision: Option<CompatibilityDecision>,
    pub finished_at: DateTime<Utc>,
}

/// Drives a [`StreamRunner`] until the model stops calling tools.
#[derive(Clone)]
pub struct Orchestrator {
    runner: StreamRunner,
    strict_policy: bool,
    max_rounds: usize,
}

impl Orchestrator {
    pub fn new(runner: StreamRunner) -> Self {
        Self {
            runner,
            strict_policy: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Take the policy mode and round cap from config.
    pub fn from_config(runner: StreamRunner, config: &BrookConfig) -> Self {
        Self::new(runner)
            .with_strict_policy(config.strict_policy())
            .with_max_rounds(config.max_tool_rounds())
    }

    pub fn with_strict_policy(mut self, strict: bool) -> Self {
        self.strict_policy = strict;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn runner(&self) -> &StreamRunner {
        &self.runner
    }

    /// Run one turn.
    ///
    /// Any fatal error is reported to the client as a single `error` event
    /// (unless the turn was canceled) and then returned.
    pub async fn run_turn(
        &self,
        mut request: ResponseRequest,
        ctx: &ToolContext,
        emitter: &dyn SseEmitter,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let decision = match request.reasoning_effort {
            Some(effort) => {
                let built_in = request.built_in_tools();
                match policy::decide(effort, &built_in, self.strict_policy) {
                    Ok(decision) => {
                        request.reasoning_effort = Some(decision.effort);
                        Some(decision)
                    }
                    Err(e) => return Err(report(e, emitter).await),
                }
            }
            None => None,
        };

        let mut steps: Vec<StreamStepResult> = Vec::new();
        let mut round_limit_reached = false;

        loop {
            let round = steps.len() + 1;
            debug!(round, session_id = %ctx.session_id, "starting step");
            let step = match self.runner.run_step(&request, ctx, emitter, cancel).await {
                Ok(step) => step,
                Err(e) => return Err(report(e, emitter).await),
            };

            let feedback: Vec<InputItem> =
                step.tool_calls.iter().map(|call| call.to_input_item()).collect();
            let previous_response_id = step.response_id.clone();
            steps.push(step);

            if feedback.is_empty() {
                break;
            }
            if steps.len() >= self.max_rounds {
                warn!(
                    rounds = steps.len(),
                    max_rounds = self.max_rounds,
                    "tool round limit reached"
                );
                round_limit_reached = true;
                break;
            }

            request.input = feedback;
            request.previous_response_id =
                (!previous_response_id.is_empty()).then_some(previous_response_id);
        }

        let outcome = TurnOutcome {
            response_id: steps
                .last()
                .map(|s| s.response_id.clone())
                .unwrap_or_default(),
            text: steps
                .iter()
                .map(|s| s.text.as_str())
                .filter(|t| !t.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
            images: steps.iter().flat_map(|s| s.images.clone()).collect(),
            rounds: steps.len(),
            steps,
            round_limit_reached,
            decision,
            finished_at: Utc::now(),
        };
        info!(
            response_id = %outcome.response_id,
            rounds = outcome.rounds,
            images = outcome.images.len(),
            "turn finished"
        );
        Ok(outcome)
    }
}

async fn report(error: BrookError, emitter: &dyn SseEmitter) -> BrookError {
    if !matches!(error, BrookError::Canceled(_)) {
        if let Err(emit_err) = emitter.emit(ProgressEvent::error(error.to_string())).await {
            debug!(error = %emit_err, "could not deliver terminal error event");
        }
    }
    error
}
