//! Error types for brook.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::types::ReasoningEffort;

/// Primary error type for all brook operations.
#[derive(Error, Debug)]
pub enum BrookError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// The provider reported a hard failure mid-stream.
    #[error("Provider failure: {message}")]
    Provider {
        message: String,
        code: Option<String>,
    },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error(
        "Reasoning effort '{effort}' does not support tools [{}]; minimum effort is '{minimum}'",
        blocked.join(", ")
    )]
    PolicyViolation {
        effort: ReasoningEffort,
        blocked: Vec<String>,
        minimum: ReasoningEffort,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image decode error at index {index}: {message}")]
    ImageDecode { index: u32, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Canceled: {0}")]
    Canceled(String),
}

impl BrookError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a provider failure.
    pub fn provider(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Provider {
            message: message.into(),
            code,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) | Self::Stream(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Provider { .. } => ErrorCategory::Provider,
            Self::PolicyViolation { .. } => ErrorCategory::Policy,
            Self::Storage(_) | Self::ImageDecode { .. } | Self::Io(_) => ErrorCategory::Storage,
            Self::Canceled(_) => ErrorCategory::Canceled,
            Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether opening the request again might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server => {
                RecoverySuggestion::RetryWithBackoff
            }
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Policy => RecoverySuggestion::RaiseReasoningEffort,
            ErrorCategory::Storage => RecoverySuggestion::CheckStorage,
            ErrorCategory::Canceled => RecoverySuggestion::None,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BrookError>;
