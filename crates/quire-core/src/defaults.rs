//! Centralized default constants for quire.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// CONTENT GUARD
// =============================================================================

/// Maximum note length (in characters) accepted by AI actions.
///
/// Keeps the prompt inside the hosted model's context window.
pub const AI_MAX_CONTENT_CHARS: usize = 10_000;

/// Minimum trimmed note length (in characters) accepted by AI actions.
pub const AI_MIN_CONTENT_CHARS: usize = 20;

// =============================================================================
// GENERATION
// =============================================================================

/// Sampling temperature for every AI action.
pub const GEN_TEMPERATURE: f32 = 0.3;

/// Output token ceiling for every AI action.
pub const GEN_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Client-side timeout for a single completion request.
pub const GEN_TIMEOUT_SECS: u64 = 30;

/// Default hosted model (Groq).
pub const GEN_MODEL: &str = "llama-3.3-70b-versatile";

/// Default OpenAI-compatible endpoint (Groq).
pub const GEN_BASE_URL: &str = "https://api.groq.com/openai/v1";

// =============================================================================
// OUTPUT INTERPRETATION
// =============================================================================

/// Maximum number of task items returned by `extract_tasks`.
pub const MAX_TASK_ITEMS: usize = 10;

// =============================================================================
// AI HISTORY
// =============================================================================

/// Default number of runs returned by the history endpoint.
pub const AI_HISTORY_LIMIT: i64 = 5;

/// Upper bound for a caller-supplied history limit.
pub const AI_HISTORY_LIMIT_MAX: i64 = 50;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints (notes, tasks).
pub const PAGE_LIMIT: i64 = 20;

/// Maximum page size accepted by list endpoints.
pub const PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum length for note and task titles and profile names.
pub const TITLE_MAX_CHARS: usize = 255;

/// Task priority bounds (inclusive).
pub const TASK_PRIORITY_MIN: i16 = 1;
pub const TASK_PRIORITY_MAX: i16 = 5;

/// Default task priority.
pub const TASK_PRIORITY_DEFAULT: i16 = 2;

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Requests per window for the general API limiter (per client IP).
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Requests per window for AI action routes (per client IP).
pub const AI_RATE_LIMIT_REQUESTS: u32 = 20;

/// Rate limit window length (15 minutes).
pub const RATE_LIMIT_PERIOD_SECS: u64 = 900;

// =============================================================================
// AUTH
// =============================================================================

/// Expected `aud` claim on identity-provider JWTs.
pub const JWT_AUDIENCE: &str = "authenticated";

/// Tokens expiring sooner than this get refresh-hint response headers.
pub const TOKEN_REFRESH_WINDOW_SECS: i64 = 300;
