//! Model provider trait and the OpenAI Responses implementation.

pub mod events;
pub mod http;
pub mod openai_responses;
pub mod sse;

pub use events::{OutputItem, ProviderEvent};

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::BrookConfig;
use crate::error::BrookError;
use crate::types::ResponseRequest;

/// Stream of provider events for one step.
pub type ProviderEventStream = BoxStream<'static, Result<ProviderEvent, BrookError>>;

/// A model provider able to open a streaming response.
///
/// Constructed once at process start and shared by reference; dropping the
/// returned stream closes the upstream connection.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Provider name (e.g. "openai").
    fn provider_name(&self) -> &str;

    /// Open one streaming response.
    async fn stream_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<ProviderEventStream, BrookError>;
}

/// Create the default provider from config.
pub fn create_provider(config: &BrookConfig) -> Result<Arc<dyn ResponseProvider>, BrookError> {
    let api_key = config
        .api_key()
        .ok_or_else(|| BrookError::Authentication("Missing OPENAI_API_KEY".into()))?;
    Ok(Arc::new(openai_responses::OpenAiResponsesProvider::new(
        api_key,
        config.base_url(),
    )))
}
