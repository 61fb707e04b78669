//! # quire-core
//!
//! Core types, traits, and abstractions for quire.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other quire crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{AiError, AiErrorKind, Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{extract_timestamp, new_v7};
