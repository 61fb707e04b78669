//! Task CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use quire_core::{
    CreateTaskRequest, Error, ListTasksRequest, Task, TaskSort, TaskStatus, UpdateTaskRequest,
};

use super::{ApiResult, Envelope, MessageResponse, Pagination};
use crate::auth::AuthUser;
use crate::error::ErrorBody;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskData {
    pub task: Task,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskFilters {
    pub q: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i16>,
    pub sort: TaskSort,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListData {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
    pub filters: TaskFilters,
}

#[utoipa::path(get, path = "/api/tasks", tag = "Tasks",
    params(ListTasksRequest),
    responses(
        (status = 200, description = "Page of the caller's tasks", body = TaskListData),
        (status = 400, description = "Invalid filters", body = ErrorBody),
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(req): ApiQuery<ListTasksRequest>,
) -> ApiResult<Json<Envelope<TaskListData>>> {
    req.validate()?;
    let page = state.tasks.list(user.id, &req).await?;

    Ok(Envelope::ok(TaskListData {
        tasks: page.tasks,
        pagination: Pagination::new(req.limit, req.offset, page.total),
        filters: TaskFilters {
            q: req.search_text().map(String::from),
            status: req.status,
            priority: req.priority,
            sort: req.sort,
        },
    }))
}

#[utoipa::path(get, path = "/api/tasks/{id}", tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The task", body = TaskData),
        (status = 404, description = "No such task", body = ErrorBody),
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Envelope<TaskData>>> {
    let task = state.tasks.fetch(user.id, id).await?;
    Ok(Envelope::ok(TaskData { task }))
}

#[utoipa::path(post, path = "/api/tasks", tag = "Tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Created", body = TaskData),
        (status = 400, description = "Invalid task", body = ErrorBody),
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<TaskData>>)> {
    req.validate()?;
    let task = state.tasks.insert(user.id, req).await?;
    Ok((StatusCode::CREATED, Envelope::ok(TaskData { task })))
}

#[utoipa::path(patch, path = "/api/tasks/{id}", tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated", body = TaskData),
        (status = 400, description = "Invalid update", body = ErrorBody),
        (status = 404, description = "No such task", body = ErrorBody),
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Envelope<TaskData>>> {
    if req.is_empty() {
        return Err(Error::InvalidInput("At least one field must be provided".into()).into());
    }
    req.validate()?;
    let task = state.tasks.update(user.id, id, req).await?;
    Ok(Envelope::ok(TaskData { task }))
}

#[utoipa::path(delete, path = "/api/tasks/{id}", tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "No such task", body = ErrorBody),
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.tasks.delete(user.id, id).await?;
    Ok(MessageResponse::ok("Task deleted successfully"))
}
