//! Multi-step turns: policy, tool feedback and round limits.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use brook::error::BrookError;
use brook::orchestrator::Orchestrator;
use brook::stream::StreamRunner;
use brook::tools::{FnTool, ToolContext, ToolRegistry, ToolRouter};
use brook::types::{
    BuiltInTool, InputItem, ProgressEvent, ReasoningEffort, ResponseRequest, ToolSpec,
};
use brook::util::RetryPolicy;
use common::*;

fn orchestrator(provider: Arc<ScriptedProvider>, router: Arc<dyn ToolRouter>) -> Orchestrator {
    let runner = StreamRunner::new(provider, router, Arc::new(MemoryBlobStore::new()))
        .with_retry_policy(RetryPolicy::none());
    Orchestrator::new(runner)
}

fn request(effort: Option<ReasoningEffort>, tools: Vec<ToolSpec>) -> ResponseRequest {
    ResponseRequest::builder()
        .model("gpt-5")
        .instructions("be brief")
        .input(vec![InputItem::user("what time is it?")])
        .tools(tools)
        .maybe_reasoning_effort(effort)
        .build()
}

#[tokio::test]
async fn tool_results_are_fed_back_with_previous_response_id() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_events(tool_step("resp_1", "call_1", "current_time", "{}"))
            .with_events(text_step("resp_2", "It is noon.")),
    );
    let registry = ToolRegistry::new().with_tool(Arc::new(FnTool::new(
        "current_time",
        "Current time",
        json!({"type": "object", "properties": {}}),
        |_args, _ctx| async { Ok(json!({"utc": "12:00"})) },
    )));
    let orchestrator = orchestrator(provider.clone(), Arc::new(registry));
    let emitter = CapturingEmitter::new();

    let outcome = orchestrator
        .run_turn(
            request(None, vec![]),
            &ToolContext::new("s"),
            &emitter,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert!(!outcome.round_limit_reached);
    assert_eq!(outcome.response_id, "resp_2");
    assert_eq!(outcome.text, "It is noon.");
    assert_eq!(outcome.decision, None);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].previous_response_id, None);
    assert_eq!(requests[1].previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(requests[1].instructions.as_deref(), Some("be brief"));
    match requests[1].input.as_slice() {
        [InputItem::FunctionCallOutput { call_id, output }] => {
            assert_eq!(call_id, "call_1");
            let output: serde_json::Value = serde_json::from_str(output).unwrap();
            assert_eq!(output, json!({"success": true, "output": {"utc": "12:00"}}));
        }
        other => panic!("unexpected feedback input: {other:?}"),
    }
    assert!(emitter.errors().is_empty());
}

#[tokio::test]
async fn round_limit_stops_the_loop_without_error() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_events(tool_step("resp_1", "call_1", "lookup", "{}"))
            .with_events(tool_step("resp_2", "call_2", "lookup", "{}"))
            .with_events(text_step("resp_3", "unreached")),
    );
    let orchestrator =
        orchestrator(provider.clone(), Arc::new(RecordingRouter::new())).with_max_rounds(2);

    let outcome = orchestrator
        .run_turn(
            request(None, vec![]),
            &ToolContext::new("s"),
            &CapturingEmitter::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert!(outcome.round_limit_reached);
    assert_eq!(outcome.steps[1].tool_calls[0].id, "call_2");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn strict_policy_violation_never_reaches_the_provider() {
    let provider = Arc::new(ScriptedProvider::new().with_events(text_step("resp_1", "x")));
    let orchestrator =
        orchestrator(provider.clone(), Arc::new(RecordingRouter::new())).with_strict_policy(true);
    let emitter = CapturingEmitter::new();

    let err = orchestrator
        .run_turn(
            request(
                Some(ReasoningEffort::Minimal),
                vec![BuiltInTool::ImageGeneration.into()],
            ),
            &ToolContext::new("s"),
            &emitter,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match &err {
        BrookError::PolicyViolation {
            effort,
            blocked,
            minimum,
        } => {
            assert_eq!(*effort, ReasoningEffort::Minimal);
            assert_eq!(blocked, &vec!["image_generation".to_string()]);
            assert_eq!(*minimum, ReasoningEffort::Low);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.calls(), 0);
    assert_eq!(emitter.events(), vec![ProgressEvent::error(err.to_string())]);
}

#[tokio::test]
async fn lenient_policy_raises_effort_in_the_request() {
    let provider = Arc::new(ScriptedProvider::new().with_events(text_step("resp_1", "drawn")));
    let orchestrator = orchestrator(provider.clone(), Arc::new(RecordingRouter::new()));

    let outcome = orchestrator
        .run_turn(
            request(
                Some(ReasoningEffort::Minimal),
                vec![BuiltInTool::ImageGeneration.into()],
            ),
            &ToolContext::new("s"),
            &CapturingEmitter::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let decision = outcome.decision.unwrap();
    assert!(decision.coerced);
    assert_eq!(decision.effort, ReasoningEffort::Low);
    assert_eq!(
        provider.requests()[0].reasoning_effort,
        Some(ReasoningEffort::Low)
    );
}

#[tokio::test]
async fn fatal_step_error_emits_one_terminal_error_event() {
    let provider = Arc::new(ScriptedProvider::new().with_events(vec![
        created("resp_1"),
        delta("partial"),
        failed("upstream exploded"),
    ]));
    let orchestrator = orchestrator(provider, Arc::new(RecordingRouter::new()));
    let emitter = CapturingEmitter::new();

    let err = orchestrator
        .run_turn(
            request(None, vec![]),
            &ToolContext::new("s"),
            &emitter,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BrookError::Provider { .. }));
    assert_eq!(emitter.errors(), vec![err.to_string()]);
}

#[tokio::test]
async fn canceled_turn_emits_no_error_event() {
    let provider = Arc::new(ScriptedProvider::new().with_events(text_step("resp_1", "x")));
    let orchestrator = orchestrator(provider.clone(), Arc::new(RecordingRouter::new()));
    let emitter = CapturingEmitter::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orchestrator
        .run_turn(request(None, vec![]), &ToolContext::new("s"), &emitter, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, BrookError::Canceled(_)));
    assert!(emitter.events().is_empty());
    assert_eq!(provider.calls(), 0);
}
