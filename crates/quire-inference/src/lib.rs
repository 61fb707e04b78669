//! # quire-inference
//!
//! AI action pipeline for quire notes.
//!
//! This crate provides:
//! - Content guard applied before any model call
//! - Fixed prompt templates per action
//! - Output interpretation (pass-through text, task extraction)
//! - The [`AiPipeline`] orchestrator that records successful runs
//! - OpenAI-compatible backend (feature `openai`, default; targets Groq)
//! - Mock backend and in-memory run log (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quire_core::{AiAction, AiRunRepository};
//! use quire_inference::openai::OpenAIBackend;
//! use quire_inference::AiPipeline;
//!
//! async fn summarize(runs: Arc<dyn AiRunRepository>, content: &str) -> quire_core::Result<String> {
//!     let backend = Arc::new(OpenAIBackend::from_env()?);
//!     let pipeline = AiPipeline::new(backend, runs);
//!     let user = uuid::Uuid::now_v7();
//!     let note = uuid::Uuid::now_v7();
//!     let outcome = pipeline.run(user, note, AiAction::Summarize, content).await?;
//!     Ok(outcome.output.display_text)
//! }
//! ```

pub mod guard;
pub mod interpret;
pub mod pipeline;
pub mod prompts;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use guard::ContentGuard;
pub use interpret::{extract_tasks, interpret, ExtractedTasks, TaskSource};
pub use pipeline::{load_history, AiPipeline};
pub use prompts::{PromptPair, PromptTemplate};
