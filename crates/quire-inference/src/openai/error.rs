//! Provider error classification.

use quire_core::ModelFailure;

/// OpenAI-compatible error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid or missing credentials.
    AuthenticationError,
    RateLimitExceeded,
    ModelNotFound,
    ContextLengthExceeded,
    ServerError,
    Unknown,
}

impl OpenAIErrorCode {
    /// Classify from HTTP status plus the body's `type` and `code` fields.
    pub fn from_response(status: u16, error_type: Option<&str>, code: Option<&str>) -> Self {
        let is_auth_label = |s: Option<&str>| {
            matches!(s, Some("invalid_api_key") | Some("authentication_error"))
        };

        match status {
            401 | 403 => Self::AuthenticationError,
            _ if is_auth_label(error_type) || is_auth_label(code) => Self::AuthenticationError,
            429 => Self::RateLimitExceeded,
            404 => Self::ModelNotFound,
            _ if code == Some("model_not_found") => Self::ModelNotFound,
            400 if error_type.unwrap_or_default().contains("context_length")
                || code.unwrap_or_default().contains("context_length") =>
            {
                Self::ContextLengthExceeded
            }
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Convert a classified provider error into a pipeline failure.
pub fn to_model_failure(code: OpenAIErrorCode, message: &str) -> ModelFailure {
    match code {
        OpenAIErrorCode::AuthenticationError => ModelFailure::Auth(message.to_string()),
        OpenAIErrorCode::RateLimitExceeded => {
            ModelFailure::Generation(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => {
            ModelFailure::Generation(format!("Model not found: {}", message))
        }
        OpenAIErrorCode::ContextLengthExceeded => {
            ModelFailure::Generation(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::ServerError => ModelFailure::Generation(format!("Server error: {}", message)),
        OpenAIErrorCode::Unknown => ModelFailure::Generation(message.to_string()),
    }
}
