//! Error types for quire.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using quire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found (or not owned by the caller)
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Task not found (or not owned by the caller)
    #[error("Task not found: {0}")]
    TaskNotFound(uuid::Uuid),

    /// AI pipeline failure with a stable kind
    #[error(transparent)]
    Ai(#[from] AiError),

    /// Inference backend could not be built or used
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

// =============================================================================
// AI PIPELINE ERRORS
// =============================================================================

/// Failure of one stage of the AI action pipeline.
///
/// Ordered from the lowest layer (content guard) to the highest (output
/// interpreter). Every variant maps to a stable [`AiErrorKind`] so callers
/// can branch on the kind instead of the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("Note content is empty. Please add content before using AI features.")]
    EmptyContent,

    #[error("Note content is too long ({length} characters, maximum is {max}).")]
    ContentTooLong { length: usize, max: usize },

    #[error("Note content is too short ({length} characters, minimum is {min}). Add more detail before using AI features.")]
    ContentTooShort { length: usize, min: usize },

    #[error("Unknown AI action '{0}'. Supported actions: summarize, improve, extract_tasks.")]
    UnknownAction(String),

    #[error("AI provider is not configured. Set GROQ_API_KEY to enable AI features.")]
    Unconfigured,

    /// Provider detail is kept for logs and never rendered.
    #[error("AI provider rejected the configured API key.")]
    AuthError(String),

    #[error("AI generation failed. Please try again.")]
    GenerationError(String),

    #[error("AI provider did not respond within {0} seconds.")]
    Timeout(u64),

    #[error("No actionable tasks found in your note. Try adding specific action items like \"Call John\" or \"Review report\".")]
    NoActionableItems,

    #[error("Could not extract tasks from the note. Try rephrasing with clearer action items.")]
    NoExtractableContent,
}

/// Machine-readable kind of an [`AiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiErrorKind {
    EmptyContent,
    ContentTooLong,
    ContentTooShort,
    UnknownAction,
    #[serde(rename = "AI_UNCONFIGURED")]
    Unconfigured,
    #[serde(rename = "AI_AUTH_ERROR")]
    AuthError,
    #[serde(rename = "AI_GENERATION_ERROR")]
    GenerationError,
    #[serde(rename = "AI_TIMEOUT")]
    Timeout,
    NoActionableItems,
    NoExtractableContent,
}

impl AiErrorKind {
    /// Stable code sent to API clients.
    pub fn as_code(&self) -> &'static str {
        match self {
            AiErrorKind::EmptyContent => "EMPTY_CONTENT",
            AiErrorKind::ContentTooLong => "CONTENT_TOO_LONG",
            AiErrorKind::ContentTooShort => "CONTENT_TOO_SHORT",
            AiErrorKind::UnknownAction => "UNKNOWN_ACTION",
            AiErrorKind::Unconfigured => "AI_UNCONFIGURED",
            AiErrorKind::AuthError => "AI_AUTH_ERROR",
            AiErrorKind::GenerationError => "AI_GENERATION_ERROR",
            AiErrorKind::Timeout => "AI_TIMEOUT",
            AiErrorKind::NoActionableItems => "NO_ACTIONABLE_ITEMS",
            AiErrorKind::NoExtractableContent => "NO_EXTRACTABLE_CONTENT",
        }
    }
}

impl std::fmt::Display for AiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl AiError {
    pub fn kind(&self) -> AiErrorKind {
        match self {
            AiError::EmptyContent => AiErrorKind::EmptyContent,
            AiError::ContentTooLong { .. } => AiErrorKind::ContentTooLong,
            AiError::ContentTooShort { .. } => AiErrorKind::ContentTooShort,
            AiError::UnknownAction(_) => AiErrorKind::UnknownAction,
            AiError::Unconfigured => AiErrorKind::Unconfigured,
            AiError::AuthError(_) => AiErrorKind::AuthError,
            AiError::GenerationError(_) => AiErrorKind::GenerationError,
            AiError::Timeout(_) => AiErrorKind::Timeout,
            AiError::NoActionableItems => AiErrorKind::NoActionableItems,
            AiError::NoExtractableContent => AiErrorKind::NoExtractableContent,
        }
    }

    /// Provider-side detail for logging, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AiError::AuthError(detail) | AiError::GenerationError(detail) => Some(detail),
            _ => None,
        }
    }

    /// Whether re-running the whole pipeline may succeed.
    ///
    /// Only transient provider failures qualify. Nothing is recorded on
    /// failure, so a retry never duplicates history.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::GenerationError(_) | AiError::Timeout(_))
    }
}
