//! Shared test helpers: scripted provider, recording router, in-memory store.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use brook::error::BrookError;
use brook::images::{BlobStore, SavedBlob};
use brook::provider::{OutputItem, ProviderEvent, ProviderEventStream, ResponseProvider};
use brook::stream::SseEmitter;
use brook::tools::{ToolArguments, ToolContext, ToolRouter};
use brook::types::{ProgressEvent, ResponseRequest, ToolOutcome};

/// One queued provider response.
pub enum Script {
    /// Yield these events, then end.
    Events(Vec<ProviderEvent>),
    /// Yield these events, then never end.
    Hanging(Vec<ProviderEvent>),
    /// Fail while opening the stream.
    OpenError(BrookError),
}

/// A provider that replays queued event scripts, one per call.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ResponseRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(self, events: Vec<ProviderEvent>) -> Self {
        self.push(Script::Events(events));
        self
    }

    pub fn push(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<ResponseRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ResponseProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn stream_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<ProviderEventStream, BrookError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Events(vec![]));
        match script {
            Script::Events(events) => Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed()),
            Script::Hanging(events) => Ok(futures::stream::iter(events.into_iter().map(Ok))
                .chain(futures::stream::pending())
                .boxed()),
            Script::OpenError(e) => Err(e),
        }
    }
}

/// Router that echoes arguments back and records every call.
#[derive(Default)]
pub struct RecordingRouter {
    calls: Mutex<Vec<(String, serde_json::Value, Option<String>)>>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(name, arguments, call_id)` per call.
    pub fn calls(&self) -> Vec<(String, serde_json::Value, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRouter for RecordingRouter {
    async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, BrookError> {
        self.calls.lock().unwrap().push((
            name.to_string(),
            args.raw().clone(),
            ctx.call_id.clone(),
        ));
        Ok(ToolOutcome::ok(serde_json::json!({ "echo": args.raw() })))
    }
}

/// In-memory blob store; optionally fails every save.
#[derive(Default)]
pub struct MemoryBlobStore {
    saved: Mutex<Vec<(Vec<u8>, String)>>,
    failing: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// `(bytes, mime_type)` per successful save.
    pub fn saved(&self) -> Vec<(Vec<u8>, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, bytes: &[u8], mime_type: &str) -> Result<SavedBlob, BrookError> {
        if self.failing {
            return Err(BrookError::Storage("disk full".into()));
        }
        let format = mime_type.trim_start_matches("image/").to_string();
        let mut saved = self.saved.lock().unwrap();
        saved.push((bytes.to_vec(), mime_type.to_string()));
        let storage_path = format!("img-{}.{}", saved.len(), format);
        Ok(SavedBlob {
            url: format!("/mem/{storage_path}"),
            storage_path,
            format,
        })
    }
}

/// Emitter that records every event.
#[derive(Default)]
pub struct CapturingEmitter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CapturingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Error { error } => Some(error),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SseEmitter for CapturingEmitter {
    async fn emit(&self, event: ProgressEvent) -> Result<(), BrookError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// Event builders.

pub fn created(id: &str) -> ProviderEvent {
    ProviderEvent::Created {
        response_id: id.to_string(),
    }
}

pub fn delta(text: &str) -> ProviderEvent {
    ProviderEvent::TextDelta {
        delta: text.to_string(),
    }
}

pub fn completed(id: &str) -> ProviderEvent {
    ProviderEvent::Completed {
        response_id: id.to_string(),
    }
}

pub fn failed(message: &str) -> ProviderEvent {
    ProviderEvent::Failed {
        message: message.to_string(),
        code: Some("server_error".to_string()),
    }
}

pub fn function_call(call_id: &str, name: &str, arguments: &str) -> OutputItem {
    OutputItem::FunctionCall {
        id: Some(format!("fc_{call_id}")),
        call_id: call_id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

pub fn call_added(index: u32, call_id: &str, name: &str) -> ProviderEvent {
    ProviderEvent::OutputItemAdded {
        index,
        item: function_call(call_id, name, ""),
    }
}

pub fn args_delta(index: u32, fragment: &str) -> ProviderEvent {
    ProviderEvent::ToolCallDelta {
        index,
        delta: fragment.to_string(),
    }
}

pub fn call_done(index: u32, call_id: &str, name: &str, arguments: &str) -> ProviderEvent {
    ProviderEvent::OutputItemDone {
        index,
        item: function_call(call_id, name, arguments),
    }
}

/// A complete step that calls one tool with `arguments`.
pub fn tool_step(response_id: &str, call_id: &str, name: &str, arguments: &str) -> Vec<ProviderEvent> {
    vec![
        created(response_id),
        call_added(0, call_id, name),
        args_delta(0, arguments),
        call_done(0, call_id, name, arguments),
        completed(response_id),
    ]
}

/// A complete step that only streams `text`.
pub fn text_step(response_id: &str, text: &str) -> Vec<ProviderEvent> {
    vec![created(response_id), delta(text), completed(response_id)]
}
