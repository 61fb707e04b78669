//! Interpretation of raw model text into caller-facing output.
//!
//! Summaries and rewrites pass through verbatim. Task extraction runs a
//! small stage pipeline: a JSON array anywhere in the text, then a
//! bullet/numbered line heuristic, then failure.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use quire_core::defaults::MAX_TASK_ITEMS;
use quire_core::{AiAction, AiError, InterpretedOutput};

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*•]\s+").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+").unwrap());
static TASK_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^task\s*\d*:\s*").unwrap());

/// Which stage produced the task items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    JsonArray,
    LineHeuristic,
}

impl TaskSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskSource::JsonArray => "json_array",
            TaskSource::LineHeuristic => "line_heuristic",
        }
    }
}

/// Non-empty, ordered task strings, at most [`MAX_TASK_ITEMS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTasks {
    pub items: Vec<String>,
    pub source: TaskSource,
}

enum StageOutcome {
    Extracted(Vec<String>),
    Failed(AiError),
    Next(TaskSource),
}

impl TaskSource {
    fn run(self, raw: &str) -> StageOutcome {
        match self {
            TaskSource::JsonArray => json_array_stage(raw),
            TaskSource::LineHeuristic => line_heuristic_stage(raw),
        }
    }
}

fn json_array_stage(raw: &str) -> StageOutcome {
    let Some(m) = JSON_ARRAY.find(raw) else {
        return StageOutcome::Next(TaskSource::LineHeuristic);
    };
    let values = match serde_json::from_str::<serde_json::Value>(m.as_str()) {
        Ok(serde_json::Value::Array(values)) => values,
        _ => return StageOutcome::Next(TaskSource::LineHeuristic),
    };

    let items: Vec<String> = values
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_TASK_ITEMS)
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        StageOutcome::Failed(AiError::NoActionableItems)
    } else {
        StageOutcome::Extracted(items)
    }
}

fn line_heuristic_stage(raw: &str) -> StageOutcome {
    let items: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| {
            BULLET.is_match(line) || NUMBERED.is_match(line) || TASK_LABEL.is_match(line)
        })
        .map(|line| {
            let line = BULLET.replace(line, "");
            let line = NUMBERED.replace(&line, "");
            TASK_LABEL.replace(&line, "").trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .take(MAX_TASK_ITEMS)
        .collect();

    if items.is_empty() {
        StageOutcome::Failed(AiError::NoExtractableContent)
    } else {
        StageOutcome::Extracted(items)
    }
}

/// Pull task items out of raw `extract_tasks` output.
pub fn extract_tasks(raw: &str) -> Result<ExtractedTasks, AiError> {
    let mut stage = TaskSource::JsonArray;
    loop {
        match stage.run(raw) {
            StageOutcome::Extracted(items) => {
                return Ok(ExtractedTasks {
                    items,
                    source: stage,
                })
            }
            StageOutcome::Failed(err) => return Err(err),
            StageOutcome::Next(next) => {
                debug!(
                    component = "interpreter",
                    from = stage.as_str(),
                    to = next.as_str(),
                    "Task extraction stage fell through"
                );
                stage = next;
            }
        }
    }
}

/// Interpret raw model text for `action`. `display_text` is always `raw`.
pub fn interpret(action: AiAction, raw: &str) -> Result<InterpretedOutput, AiError> {
    let task_items = match action {
        AiAction::Summarize | AiAction::Improve => None,
        AiAction::ExtractTasks => {
            let extracted = extract_tasks(raw)?;
            debug!(
                subsystem = "inference",
                component = "interpreter",
                task_count = extracted.items.len(),
                task_source = extracted.source.as_str(),
                "Extracted task items"
            );
            Some(extracted.items)
        }
    };

    Ok(InterpretedOutput {
        display_text: raw.to_string(),
        task_items,
    })
}
