//! Note CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use quire_core::{CreateNoteRequest, Error, ListNotesRequest, Note, NoteSort, UpdateNoteRequest};

use super::{ApiResult, Envelope, MessageResponse, Pagination};
use crate::auth::AuthUser;
use crate::error::ErrorBody;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteData {
    pub note: Note,
}

/// Filters echoed back with a note listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct NoteFilters {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub pinned: Option<bool>,
    pub sort: NoteSort,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteListData {
    pub notes: Vec<Note>,
    pub pagination: Pagination,
    pub filters: NoteFilters,
}

#[utoipa::path(get, path = "/api/notes", tag = "Notes",
    params(ListNotesRequest),
    responses(
        (status = 200, description = "Page of the caller's notes", body = NoteListData),
        (status = 400, description = "Invalid filters", body = ErrorBody),
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(req): ApiQuery<ListNotesRequest>,
) -> ApiResult<Json<Envelope<NoteListData>>> {
    req.validate()?;
    let page = state.notes.list(user.id, &req).await?;

    Ok(Envelope::ok(NoteListData {
        notes: page.notes,
        pagination: Pagination::new(req.limit, req.offset, page.total),
        filters: NoteFilters {
            q: req.search_text().map(String::from),
            tag: req.tag,
            pinned: req.pinned,
            sort: req.sort,
        },
    }))
}

#[utoipa::path(get, path = "/api/notes/{id}", tag = "Notes",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "The note", body = NoteData),
        (status = 404, description = "No such note", body = ErrorBody),
    )
)]
pub async fn get_note(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Envelope<NoteData>>> {
    let note = state.notes.fetch(user.id, id).await?;
    Ok(Envelope::ok(NoteData { note }))
}

#[utoipa::path(post, path = "/api/notes", tag = "Notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Created", body = NoteData),
        (status = 400, description = "Invalid note", body = ErrorBody),
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<NoteData>>)> {
    req.validate()?;
    let note = state.notes.insert(user.id, req).await?;
    Ok((StatusCode::CREATED, Envelope::ok(NoteData { note })))
}

#[utoipa::path(patch, path = "/api/notes/{id}", tag = "Notes",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated", body = NoteData),
        (status = 400, description = "Invalid update", body = ErrorBody),
        (status = 404, description = "No such note", body = ErrorBody),
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateNoteRequest>,
) -> ApiResult<Json<Envelope<NoteData>>> {
    if req.is_empty() {
        return Err(Error::InvalidInput("At least one field must be provided".into()).into());
    }
    req.validate()?;
    let note = state.notes.update(user.id, id, req).await?;
    Ok(Envelope::ok(NoteData { note }))
}

#[utoipa::path(delete, path = "/api/notes/{id}", tag = "Notes",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "No such note", body = ErrorBody),
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.notes.delete(user.id, id).await?;
    Ok(MessageResponse::ok("Note deleted successfully"))
}
