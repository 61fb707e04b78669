//! Core traits for quire abstractions.
//!
//! Storage and inference sit behind these traits so the API and the AI
//! pipeline can run against Postgres and a hosted model in production and
//! against in-memory fakes in tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::defaults;
use crate::error::{AiError, Result};
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Note CRUD. Every call is scoped to the owning user; a note owned by
/// someone else behaves exactly like a missing one.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn insert(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch one note, `Error::NoteNotFound` if absent or not owned.
    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    async fn list(&self, user_id: Uuid, req: &ListNotesRequest) -> Result<ListNotesResponse>;

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Delete a note. Its AI runs go with it.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// TASK REPOSITORY
// =============================================================================

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, user_id: Uuid, req: CreateTaskRequest) -> Result<Task>;

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Task>;

    async fn list(&self, user_id: Uuid, req: &ListTasksRequest) -> Result<ListTasksResponse>;

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateTaskRequest) -> Result<Task>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// PROFILE REPOSITORY
// =============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Return the caller's profile, creating a default one on first access.
    async fn fetch_or_create(&self, user_id: Uuid) -> Result<Profile>;

    async fn update(&self, user_id: Uuid, req: UpdateProfileRequest) -> Result<Profile>;
}

// =============================================================================
// AI RUN REPOSITORY
// =============================================================================

/// Append-only log of successful AI actions.
#[async_trait]
pub trait AiRunRepository: Send + Sync {
    /// Persist one run. Identifier and timestamp are assigned here.
    async fn record(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        action: AiAction,
        output: &str,
    ) -> Result<AiRun>;

    /// Most recent runs for a note, newest first, at most `limit`.
    async fn history(&self, user_id: Uuid, note_id: Uuid, limit: i64) -> Result<Vec<AiRun>>;
}

// =============================================================================
// GENERATION BACKEND
// =============================================================================

/// A single non-streaming completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl ModelRequest {
    /// Request with the shared generation defaults.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: defaults::GEN_TEMPERATURE,
            max_output_tokens: defaults::GEN_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Why a completion produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelFailure {
    /// Provider rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport failure, non-success status, or empty/malformed response.
    #[error("generation failed: {0}")]
    Generation(String),

    /// No response within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ModelFailure> for AiError {
    fn from(failure: ModelFailure) -> Self {
        match failure {
            ModelFailure::Auth(msg) => AiError::AuthError(msg),
            ModelFailure::Generation(msg) => AiError::GenerationError(msg),
            ModelFailure::Timeout(after) => AiError::Timeout(after.as_secs()),
        }
    }
}

pub type ModelResult = std::result::Result<String, ModelFailure>;

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run one completion and return the first choice's text.
    ///
    /// Dropping the returned future abandons the request.
    async fn complete(&self, req: &ModelRequest) -> ModelResult;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_request_uses_generation_defaults() {
        let req = ModelRequest::new("sys", "user");
        assert_eq!(req.temperature, defaults::GEN_TEMPERATURE);
        assert_eq!(req.max_output_tokens, defaults::GEN_MAX_OUTPUT_TOKENS);
        assert_eq!(req.system, "sys");
        assert_eq!(req.user, "user");
    }

    #[test]
    fn test_model_failure_maps_to_ai_error() {
        assert_eq!(
            AiError::from(ModelFailure::Auth("invalid key".into())),
            AiError::AuthError("invalid key".into())
        );
        assert_eq!(
            AiError::from(ModelFailure::Generation("503".into())),
            AiError::GenerationError("503".into())
        );
        assert_eq!(
            AiError::from(ModelFailure::Timeout(Duration::from_secs(30))),
            AiError::Timeout(30)
        );
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn accepts_backend(_: Option<&dyn GenerationBackend>) {}
        fn accepts_runs(_: Option<&dyn AiRunRepository>) {}
        fn accepts_notes(_: Option<&dyn NoteRepository>) {}
        accepts_backend(None);
        accepts_runs(None);
        accepts_notes(None);
    }
}
