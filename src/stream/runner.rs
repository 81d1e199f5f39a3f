//! Consumes one provider stream into a [`StreamStepResult`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::emitter::SseEmitter;
use crate::error::BrookError;
use crate::images::{BlobStore, ImagePersister, ImageReassembler};
use crate::provider::{OutputItem, ProviderEvent, ProviderEventStream, ResponseProvider};
use crate::tools::{ToolContext, ToolExecutor, ToolRouter};
use crate::types::{ExecutedToolCall, ProgressEvent, ResponseRequest, StoredImage, StreamStepResult};
use crate::util::RetryPolicy;

/// Runs single steps: open a provider stream, dispatch its events, aggregate.
///
/// Holds only shared collaborators; all accumulator state lives in a
/// per-call `StepState`, so one runner can serve many sessions at once.
#[derive(Clone)]
pub struct StreamRunner {
    provider: Arc<dyn ResponseProvider>,
    router: Arc<dyn ToolRouter>,
    persister: ImagePersister,
    retry: RetryPolicy,
}

impl StreamRunner {
    pub fn new(
        provider: Arc<dyn ResponseProvider>,
        router: Arc<dyn ToolRouter>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            provider,
            router,
            persister: ImagePersister::new(store),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy used when opening the stream.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ResponseProvider> {
        &self.provider
    }

    /// Run one step to completion.
    ///
    /// Tool failures and image storage failures are folded into the result
    /// and progress events; provider failures, transport errors, premature
    /// end of stream and cancellation are returned as `Err` with no partial
    /// result.
    pub async fn run_step(
        &self,
        request: &ResponseRequest,
        ctx: &ToolContext,
        emitter: &dyn SseEmitter,
        cancel: &CancellationToken,
    ) -> Result<StreamStepResult, BrookError> {
        if cancel.is_cancelled() {
            return Err(BrookError::Canceled("turn canceled".into()));
        }
        let provider = &self.provider;
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(BrookError::Canceled("turn canceled".into()));
            }
            opened = self.retry.execute(|| provider.stream_response(request)) => opened?,
        };
        debug!(provider = provider.provider_name(), model = %request.model, "provider stream opened");
        self.consume(stream, ctx, emitter, cancel).await
    }

    /// Dispatch every event of an already-open stream.
    pub async fn consume(
        &self,
        mut stream: ProviderEventStream,
        ctx: &ToolContext,
        emitter: &dyn SseEmitter,
        cancel: &CancellationToken,
    ) -> Result<StreamStepResult, BrookError> {
        let mut step = StepState::new(self.router.clone(), ctx.clone());

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(response_id = %step.response_id, "step canceled");
                    return Err(BrookError::Canceled("turn canceled".into()));
                }
                next = stream.next() => next,
            };
            let Some(event) = next else {
                return Err(BrookError::Stream(
                    "provider stream ended before response.completed".into(),
                ));
            };
            if step.handle(event?, &self.persister, emitter).await? {
                break;
            }
        }

        Ok(step.finish())
    }
}

/// Accumulators for one step; dropped when the step ends.
struct StepState {
    text: String,
    response_id: String,
    ctx: ToolContext,
    tools: ToolExecutor,
    images: ImageReassembler,
    image_formats: HashMap<u32, String>,
    completed_images: HashSet<u32>,
    stored: Vec<StoredImage>,
    tool_calls: Vec<ExecutedToolCall>,
}

impl StepState {
    fn new(router: Arc<dyn ToolRouter>, ctx: ToolContext) -> Self {
        Self {
            text: String::new(),
            response_id: String::new(),
            ctx,
            tools: ToolExecutor::new(router),
            images: ImageReassembler::new(),
            image_formats: HashMap::new(),
            completed_images: HashSet::new(),
            stored: Vec::new(),
            tool_calls: Vec::new(),
        }
    }

    /// Apply one event. Returns true once the response completed.
    async fn handle(
        &mut self,
        event: ProviderEvent,
        persister: &ImagePersister,
        emitter: &dyn SseEmitter,
    ) -> Result<bool, BrookError> {
        match event {
            ProviderEvent::Created { response_id } => {
                self.ctx.response_id = Some(response_id.clone());
                self.response_id = response_id.clone();
                emitter
                    .emit(ProgressEvent::ResponseCreated { id: response_id })
                    .await?;
            }
            ProviderEvent::TextDelta { delta } => {
                if !delta.is_empty() {
                    self.text.push_str(&delta);
                    emitter.emit(ProgressEvent::Delta { delta }).await?;
                }
            }
            ProviderEvent::TextDone { text } => {
                let text = text.unwrap_or_else(|| self.text.clone());
                emitter.emit(ProgressEvent::TextDone { text }).await?;
            }
            ProviderEvent::PartialImage { index, b64 } => {
                self.images.replace(index, &b64);
                emitter.emit(ProgressEvent::PartialImage { b64, index }).await?;
            }
            ProviderEvent::OutputImageDelta { index, delta } => {
                self.images.append(index, &delta);
                emitter
                    .emit(ProgressEvent::PartialImage { b64: delta, index })
                    .await?;
            }
            ProviderEvent::ImageGenerationCompleted {
                index,
                b64,
                output_format,
            } => match b64 {
                Some(b64) => {
                    self.images.discard(index);
                    self.store_image(index, Some(b64), output_format, persister, emitter)
                        .await?;
                }
                None => {
                    debug!(index, "image generation completed without payload");
                    if let Some(format) = output_format {
                        self.image_formats.insert(index, format);
                    }
                }
            },
            ProviderEvent::OutputImageCompleted {
                index,
                output_format,
            } => {
                self.store_image(index, None, output_format, persister, emitter)
                    .await?;
            }
            ProviderEvent::OutputItemAdded { index, item } => {
                if !self.tools.start(index, &item) {
                    debug!(index, item = ?item, "output item added");
                }
            }
            ProviderEvent::ToolCallDelta { index, delta } => {
                self.tools.delta(index, &delta);
            }
            ProviderEvent::OutputItemDone { index, item } => match item {
                OutputItem::FunctionCall { .. } => {
                    if let Some(call) = self.tools.finish(index, &item, &self.ctx).await {
                        emitter
                            .emit(ProgressEvent::FunctionResult {
                                name: call.name.clone(),
                                status: call.result.status(),
                                result: call.result.payload(),
                            })
                            .await?;
                        self.tool_calls.push(call);
                    }
                }
                OutputItem::ImageGenerationCall {
                    result,
                    output_format,
                    ..
                } => {
                    if result.is_some() {
                        self.images.discard(index);
                    }
                    self.store_image(index, result, output_format, persister, emitter)
                        .await?;
                }
                other => debug!(index, item = ?other, "output item done"),
            },
            ProviderEvent::Completed { response_id } => {
                if !response_id.is_empty() {
                    self.response_id = response_id;
                }
                if self.tools.open_calls() > 0 {
                    warn!(
                        response_id = %self.response_id,
                        open = self.tools.open_calls(),
                        "response completed with unfinished tool calls"
                    );
                }
                return Ok(true);
            }
            ProviderEvent::Failed { message, code } => {
                warn!(response_id = %self.response_id, code = ?code, %message, "provider reported failure");
                return Err(BrookError::provider(message, code));
            }
            ProviderEvent::Unknown { event_type, .. } => {
                debug!(event_type = %event_type, "ignoring unknown provider event");
            }
        }
        Ok(false)
    }

    /// Finalize the image at `index` from `payload` or its buffer and persist it.
    ///
    /// Decode and storage failures become `error` progress events; only an
    /// emitter failure is returned.
    async fn store_image(
        &mut self,
        index: u32,
        payload: Option<String>,
        output_format: Option<String>,
        persister: &ImagePersister,
        emitter: &dyn SseEmitter,
    ) -> Result<(), BrookError> {
        if self.completed_images.contains(&index) {
            self.images.discard(index);
            debug!(index, "image already stored for index");
            return Ok(());
        }

        let decoded = match payload {
            Some(b64) => crate::images::reassembler::decode_base64(&b64)
                .map(Some)
                .map_err(|message| BrookError::ImageDecode { index, message }),
            None => self.images.finalize(index),
        };
        let bytes = match decoded {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(index, "image completed with no buffered data");
                return Ok(());
            }
            Err(e) => {
                warn!(index, error = %e, "image payload could not be decoded");
                self.completed_images.insert(index);
                return emitter
                    .emit(ProgressEvent::error(format!("Failed to decode generated image: {e}")))
                    .await;
            }
        };
        self.completed_images.insert(index);

        let format = output_format.or_else(|| self.image_formats.remove(&index));
        match persister.persist(&bytes, format.as_deref()).await {
            Ok(image) => {
                self.text.push_str("\n\n");
                self.text.push_str(&image.markdown);
                self.text.push_str("\n\n");
                emitter
                    .emit(ProgressEvent::Image {
                        url: image.url.clone(),
                        storage_path: image.storage_path.clone(),
                        format: image.format.clone(),
                    })
                    .await?;
                self.stored.push(image);
                Ok(())
            }
            Err(e) => {
                warn!(index, error = %e, "failed to store generated image");
                emitter
                    .emit(ProgressEvent::error(format!("Failed to store generated image: {e}")))
                    .await
            }
        }
    }

    fn finish(self) -> StreamStepResult {
        StreamStepResult {
            text: self.text,
            response_id: self.response_id,
            tool_calls: self.tool_calls,
            images: self.stored,
        }
    }
}
