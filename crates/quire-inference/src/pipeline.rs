//! End-to-end AI action pipeline.
//!
//! guard -> prompt -> model -> interpret -> record. A run is recorded only
//! after interpretation succeeds, so any failure (or a dropped future)
//! leaves history untouched.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use quire_core::{
    AiAction, AiActionOutcome, AiError, AiRun, AiRunRepository, GenerationBackend, Result,
};

use crate::guard::ContentGuard;
use crate::interpret::interpret;
use crate::prompts;

/// Stateless orchestrator shared across requests.
#[derive(Clone)]
pub struct AiPipeline {
    guard: ContentGuard,
    backend: Arc<dyn GenerationBackend>,
    runs: Arc<dyn AiRunRepository>,
}

impl AiPipeline {
    pub fn new(backend: Arc<dyn GenerationBackend>, runs: Arc<dyn AiRunRepository>) -> Self {
        Self {
            guard: ContentGuard::default(),
            backend,
            runs,
        }
    }

    pub fn with_guard(mut self, guard: ContentGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Run `action` over a note's content and record the result.
    ///
    /// The caller resolves note ownership before calling.
    #[instrument(
        skip(self, content),
        fields(subsystem = "inference", component = "pipeline", op = "run")
    )]
    pub async fn run(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        action: AiAction,
        content: &str,
    ) -> Result<AiActionOutcome> {
        let start = Instant::now();

        self.guard.validate(content)?;

        let request = prompts::build(action, content).into_request();
        let raw = self
            .backend
            .complete(&request)
            .await
            .map_err(AiError::from)?;

        let output = interpret(action, &raw)?;
        let run = self.runs.record(user_id, note_id, action, &raw).await?;

        info!(
            ai_run_id = %run.id,
            model = self.backend.model_name(),
            response_len = raw.len(),
            task_count = output.task_items.as_ref().map_or(0, Vec::len),
            duration_ms = start.elapsed().as_millis() as u64,
            "AI action completed"
        );

        Ok(AiActionOutcome { run, output })
    }

    /// Recent runs for a note, newest first.
    ///
    /// Read failures degrade to an empty list.
    pub async fn history(&self, user_id: Uuid, note_id: Uuid, limit: i64) -> Vec<AiRun> {
        load_history(self.runs.as_ref(), user_id, note_id, limit).await
    }
}

/// Best-effort history read usable without a configured backend.
pub async fn load_history(
    runs: &dyn AiRunRepository,
    user_id: Uuid,
    note_id: Uuid,
    limit: i64,
) -> Vec<AiRun> {
    match runs.history(user_id, note_id, limit).await {
        Ok(runs) => runs,
        Err(e) => {
            warn!(
                subsystem = "inference",
                component = "pipeline",
                op = "history",
                %user_id,
                %note_id,
                error = %e,
                "Failed to load AI history, returning empty list"
            );
            Vec::new()
        }
    }
}
