//! Fixed prompt templates for each AI action.

use quire_core::{AiAction, ModelRequest};

/// Static prompt text for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    /// Task-specific instruction placed ahead of the note content.
    pub instruction: &'static str,
}

/// System and user messages for one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Wrap into a request carrying the shared generation settings.
    pub fn into_request(self) -> ModelRequest {
        ModelRequest::new(self.system, self.user)
    }
}

const SUMMARIZE: PromptTemplate = PromptTemplate {
    system: "You are a concise summarization assistant. Always return exactly 5 bullet points \
             followed by one key takeaway line. Use plain text, no markdown headings or formatting.",
    instruction: "Summarize the following note in exactly 5 bullet points, followed by one \
                  \"Key Takeaway:\" line",
};

const IMPROVE: PromptTemplate = PromptTemplate {
    system: "You are a professional writing assistant. Rewrite text to fix grammar and improve \
             clarity while keeping the original meaning and length within ±20%. Use a neutral, \
             professional tone. Return plain prose only.",
    instruction: "Rewrite the following text to improve grammar and clarity. Keep the meaning \
                  the same and maintain similar length (±20%)",
};

const EXTRACT_TASKS: PromptTemplate = PromptTemplate {
    system: "You are a task extraction assistant. Extract actionable tasks from text and return \
             them as a JSON array of strings. Each task should be a short, clear action item that \
             starts with a verb (max 10 tasks). Return ONLY a valid JSON array, nothing else.\n\n\
             Good: [\"Call John about the contract\", \"Review Q3 report\", \"Book flights to Berlin\"]\n\
             Bad: [\"John\", \"The report is late\", \"Meeting notes\"]\n\
             If the text contains no actionable tasks, return [].",
    instruction: "Extract actionable tasks from the following note. Return a JSON array of \
                  strings, each being a short task title (max 10 tasks)",
};

/// Template for an action. System prompts never vary between calls.
pub fn template(action: AiAction) -> &'static PromptTemplate {
    match action {
        AiAction::Summarize => &SUMMARIZE,
        AiAction::Improve => &IMPROVE,
        AiAction::ExtractTasks => &EXTRACT_TASKS,
    }
}

/// Build the prompt pair for `action` over `content`.
///
/// The user message is always `"<instruction>:\n\n<content>"`.
pub fn build(action: AiAction, content: &str) -> PromptPair {
    let tpl = template(action);
    PromptPair {
        system: tpl.system.to_string(),
        user: format!("{}:\n\n{}", tpl.instruction, content),
    }
}
