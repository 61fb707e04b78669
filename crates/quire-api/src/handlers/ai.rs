//! AI actions on notes.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use quire_core::{defaults, AiAction, AiError, AiRun};
use quire_inference::load_history;

use super::{ApiResult, Envelope};
use crate::auth::AuthUser;
use crate::error::ErrorBody;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AiActionRequest {
    /// One of `summarize`, `improve`, `extract_tasks`
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AiActionData {
    /// Model output, verbatim
    pub output: String,
    pub ai_run_id: Uuid,
    /// Extracted task items (`extract_tasks` only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_items: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AiHistoryQuery {
    /// Number of runs to return (default 5, at most 50)
    pub limit: Option<i64>,
}

impl AiHistoryQuery {
    fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(defaults::AI_HISTORY_LIMIT)
            .clamp(1, defaults::AI_HISTORY_LIMIT_MAX)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AiHistoryData {
    pub ai_runs: Vec<AiRun>,
}

/// Run an AI action over a note's stored content.
#[utoipa::path(post, path = "/api/notes/{id}/ai", tag = "AI",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = AiActionRequest,
    responses(
        (status = 200, description = "Action output", body = AiActionData),
        (status = 400, description = "Unknown action or unusable content", body = ErrorBody),
        (status = 404, description = "No such note", body = ErrorBody),
        (status = 422, description = "No tasks could be extracted", body = ErrorBody),
        (status = 429, description = "AI quota exhausted", body = ErrorBody),
        (status = 502, description = "Provider failure", body = ErrorBody),
        (status = 503, description = "AI provider not configured", body = ErrorBody),
        (status = 504, description = "Provider timed out", body = ErrorBody),
    )
)]
pub async fn run_action(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AiActionRequest>,
) -> ApiResult<Json<Envelope<AiActionData>>> {
    let action: AiAction = req.action.parse()?;
    let pipeline = state.ai.as_ref().ok_or(AiError::Unconfigured)?;
    let note = state.notes.fetch(user.id, note_id).await?;

    let outcome = pipeline.run(user.id, note.id, action, &note.content).await?;

    info!(
        subsystem = "api",
        component = "ai",
        user_id = %user.id,
        note_id = %note.id,
        action = action.as_str(),
        ai_run_id = %outcome.run.id,
        "AI action served"
    );

    Ok(Envelope::ok(AiActionData {
        output: outcome.output.display_text,
        ai_run_id: outcome.run.id,
        action_items: outcome.output.task_items,
    }))
}

/// Recent AI runs for a note, newest first.
#[utoipa::path(get, path = "/api/notes/{id}/ai-history", tag = "AI",
    params(("id" = Uuid, Path, description = "Note ID"), AiHistoryQuery),
    responses(
        (status = 200, description = "Recent runs", body = AiHistoryData),
        (status = 404, description = "No such note", body = ErrorBody),
    )
)]
pub async fn ai_history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AiHistoryQuery>,
) -> ApiResult<Json<Envelope<AiHistoryData>>> {
    let note = state.notes.fetch(user.id, note_id).await?;
    let ai_runs = load_history(
        state.ai_runs.as_ref(),
        user.id,
        note.id,
        query.effective_limit(),
    )
    .await;
    Ok(Envelope::ok(AiHistoryData { ai_runs }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_limit_defaults_and_clamps() {
        assert_eq!(AiHistoryQuery { limit: None }.effective_limit(), 5);
        assert_eq!(AiHistoryQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(AiHistoryQuery { limit: Some(12) }.effective_limit(), 12);
        assert_eq!(AiHistoryQuery { limit: Some(500) }.effective_limit(), 50);
    }

    #[test]
    fn test_action_items_omitted_when_absent() {
        let data = AiActionData {
            output: "summary".into(),
            ai_run_id: Uuid::nil(),
            action_items: None,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("action_items").is_none());
        assert_eq!(json["output"], "summary");
    }
}
