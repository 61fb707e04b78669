//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint that speaks the chat completions API. The
//! defaults target Groq.
//!
//! # Example
//!
//! ```rust,no_run
//! use quire_core::{GenerationBackend, ModelRequest};
//! use quire_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         api_key: Some("gsk_...".to_string()),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!
//!     let req = ModelRequest::new("You are terse.", "Say hello:\n\nworld");
//!     let text = backend.complete(&req).await.unwrap();
//!     println!("{text}");
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_model_failure, OpenAIErrorCode};
pub use types::*;
