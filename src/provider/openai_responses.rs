//! OpenAI Responses API streaming provider.

use std::env;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::error::BrookError;
use crate::types::ResponseRequest;

use super::events::ProviderEvent;
use super::http::{bearer_headers, shared_client, status_to_error};
use super::sse::SseDecoder;
use super::{ProviderEventStream, ResponseProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiResponsesProvider {
    api_key: String,
    base_url: String,
}

impl OpenAiResponsesProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { api_key, base_url }
    }

    pub(crate) fn build_request_body(request: &ResponseRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "input": request.input,
            "stream": true,
        });

        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if let Some(ref instructions) = request.instructions {
            obj.insert("instructions".into(), instructions.clone().into());
        }
        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request.tools.iter().map(|t| t.to_json()).collect();
            obj.insert("tools".into(), tools.into());
        }
        if let Some(effort) = request.reasoning_effort {
            obj.insert(
                "reasoning".into(),
                serde_json::json!({ "effort": effort.to_string() }),
            );
        }
        if let Some(ref previous_response_id) = request.previous_response_id {
            obj.insert(
                "previous_response_id".into(),
                previous_response_id.clone().into(),
            );
        }

        body
    }
}

fn debug_enabled() -> bool {
    matches!(env::var("BROOK_DEBUG").as_deref(), Ok("1" | "true" | "TRUE"))
}

#[async_trait]
impl ResponseProvider for OpenAiResponsesProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn stream_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<ProviderEventStream, BrookError> {
        let body = Self::build_request_body(request);
        let url = format!("{}/responses", self.base_url);

        debug!(
            model = %request.model,
            tools = request.tools.len(),
            continuation = request.previous_response_id.is_some(),
            "OpenAI Responses stream_response"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut debug_event_count = 0usize;
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(BrookError::Network(e));
                        return;
                    }
                };

                for data in decoder.push(&chunk) {
                    if debug_enabled() && debug_event_count < 5 {
                        tracing::debug!(data = %data, "OpenAI Responses SSE raw");
                        debug_event_count += 1;
                    }
                    match ProviderEvent::from_str_payload(&data) {
                        Ok(event) => yield Ok(event),
                        Err(e) => {
                            tracing::debug!(error = %e, "OpenAI Responses SSE parse failed");
                        }
                    }
                }

                if decoder.is_done() {
                    return;
                }
            }

            if let Some(data) = decoder.finish() {
                if let Ok(event) = ProviderEvent::from_str_payload(&data) {
                    yield Ok(event);
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
