//! OpenAPI document served at `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use quire_core::{
    AiAction, AiRun, CreateNoteRequest, CreateTaskRequest, Note, NoteSort, Profile, Task,
    TaskSort, TaskStatus, Theme, UpdateNoteRequest, UpdateProfileRequest, UpdateTaskRequest,
};

use crate::error::{ErrorBody, ErrorDetail};
use crate::handlers::{ai, health, notes, profile, tasks, MessageResponse, Pagination};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quire API",
        description = "Notes and tasks with AI summarize, improve and task extraction"
    ),
    paths(
        health::health,
        notes::list_notes,
        notes::get_note,
        notes::create_note,
        notes::update_note,
        notes::delete_note,
        ai::run_action,
        ai::ai_history,
        tasks::list_tasks,
        tasks::get_task,
        tasks::create_task,
        tasks::update_task,
        tasks::delete_task,
        profile::get_profile,
        profile::update_profile,
    ),
    components(schemas(
        Note, CreateNoteRequest, UpdateNoteRequest, NoteSort,
        Task, CreateTaskRequest, UpdateTaskRequest, TaskStatus, TaskSort,
        Profile, UpdateProfileRequest, Theme,
        AiAction, AiRun,
        ErrorBody, ErrorDetail, MessageResponse, Pagination,
        health::HealthResponse,
        notes::NoteData, notes::NoteListData, notes::NoteFilters,
        tasks::TaskData, tasks::TaskListData, tasks::TaskFilters,
        profile::ProfileData,
        ai::AiActionRequest, ai::AiActionData, ai::AiHistoryData,
    )),
    modifiers(&BearerAuth),
    security(("bearer_auth" = [])),
    tags(
        (name = "Notes", description = "Note CRUD operations"),
        (name = "AI", description = "AI actions and run history"),
        (name = "Tasks", description = "Task CRUD operations"),
        (name = "Profile", description = "Caller profile"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
