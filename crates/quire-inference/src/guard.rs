//! Pre-flight validation of note content before the paid model call.

use quire_core::defaults::{AI_MAX_CONTENT_CHARS, AI_MIN_CONTENT_CHARS};
use quire_core::AiError;

/// Length bounds applied to every AI action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentGuard {
    max_chars: usize,
    min_chars: usize,
}

impl Default for ContentGuard {
    fn default() -> Self {
        Self {
            max_chars: AI_MAX_CONTENT_CHARS,
            min_chars: AI_MIN_CONTENT_CHARS,
        }
    }
}

impl ContentGuard {
    pub fn new(max_chars: usize, min_chars: usize) -> Self {
        Self {
            max_chars,
            min_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Check content in order: empty, too long, too short.
    ///
    /// Lengths count Unicode scalar values. The upper bound applies to the
    /// raw content, the lower bound to the trimmed content.
    pub fn validate(&self, content: &str) -> Result<(), AiError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(AiError::EmptyContent);
        }

        let length = content.chars().count();
        if length > self.max_chars {
            return Err(AiError::ContentTooLong {
                length,
                max: self.max_chars,
            });
        }

        let trimmed_length = trimmed.chars().count();
        if trimmed_length < self.min_chars {
            return Err(AiError::ContentTooShort {
                length: trimmed_length,
                min: self.min_chars,
            });
        }

        Ok(())
    }
}
