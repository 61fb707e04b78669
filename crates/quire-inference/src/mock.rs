//! Deterministic test doubles for the AI pipeline.
//!
//! ```rust,ignore
//! use quire_core::{GenerationBackend, ModelRequest};
//! use quire_inference::mock::MockGenerationBackend;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let backend = MockGenerationBackend::new().with_response("- one\n- two");
//!     let text = backend.complete(&ModelRequest::new("sys", "user")).await.unwrap();
//!     assert_eq!(text, "- one\n- two");
//!     assert_eq!(backend.call_count(), 1);
//! }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use quire_core::{
    new_v7, AiAction, AiRun, AiRunRepository, Error, GenerationBackend, ModelFailure,
    ModelRequest, ModelResult, Result,
};

/// Mock generation backend returning a fixed result.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    calls: Arc<Mutex<Vec<ModelRequest>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    result: ModelResult,
    latency: Duration,
    model: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            result: Ok("Mock response".to_string()),
            latency: Duration::ZERO,
            model: "mock-model".to_string(),
        }
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Succeed with this text.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).result = Ok(response.into());
        self
    }

    /// Fail every call with this failure.
    pub fn with_failure(mut self, failure: ModelFailure) -> Self {
        Arc::make_mut(&mut self.config).result = Err(failure);
        self
    }

    /// Simulated latency before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(&self, req: &ModelRequest) -> ModelResult {
        self.calls.lock().unwrap().push(req.clone());
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        self.config.result.clone()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// In-memory AI run log.
#[derive(Clone, Default)]
pub struct InMemoryAiRunRepository {
    runs: Arc<Mutex<Vec<AiRun>>>,
    fail_history: bool,
    fail_record: bool,
}

impl InMemoryAiRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `history` call return a database-style error.
    pub fn with_failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    /// Make every `record` call fail.
    pub fn with_failing_record(mut self) -> Self {
        self.fail_record = true;
        self
    }

    pub fn all(&self) -> Vec<AiRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every run for a note, mirroring the cascade on note deletion.
    pub fn remove_note(&self, note_id: Uuid) {
        self.runs.lock().unwrap().retain(|r| r.note_id != note_id);
    }
}

#[async_trait]
impl AiRunRepository for InMemoryAiRunRepository {
    async fn record(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        action: AiAction,
        output: &str,
    ) -> Result<AiRun> {
        if self.fail_record {
            return Err(Error::Internal("run log unavailable".to_string()));
        }
        let run = AiRun {
            id: new_v7(),
            user_id,
            note_id,
            action,
            output: output.to_string(),
            created_at: Utc::now(),
        };
        self.runs.lock().unwrap().push(run.clone());
        Ok(run)
    }

    async fn history(&self, user_id: Uuid, note_id: Uuid, limit: i64) -> Result<Vec<AiRun>> {
        if self.fail_history {
            return Err(Error::Internal("run log unavailable".to_string()));
        }
        let runs = self.runs.lock().unwrap();
        // Insertion order is creation order.
        Ok(runs
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id && r.note_id == note_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
