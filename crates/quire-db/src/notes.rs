//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use tracing::debug;
use uuid::Uuid;

use quire_core::{
    new_v7, CreateNoteRequest, Error, ListNotesRequest, ListNotesResponse, Note, NoteRepository,
    NoteSort, Result, UpdateNoteRequest,
};

use crate::escape_like;

const NOTE_COLUMNS: &str = "id, user_id, title, content, tags, pinned, created_at, updated_at";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn note_from_row(r: &PgRow) -> Note {
    Note {
        id: r.get("id"),
        user_id: r.get("user_id"),
        title: r.get("title"),
        content: r.get("content"),
        tags: r.get::<Vec<String>, _>("tags"),
        pinned: r.get("pinned"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

/// ORDER BY clause for a sort key. `id` breaks ties deterministically.
pub(crate) fn order_by(sort: NoteSort) -> &'static str {
    match sort {
        NoteSort::UpdatedDesc => " ORDER BY updated_at DESC, id DESC",
        NoteSort::UpdatedAsc => " ORDER BY updated_at ASC, id ASC",
        NoteSort::CreatedDesc => " ORDER BY created_at DESC, id DESC",
        NoteSort::CreatedAsc => " ORDER BY created_at ASC, id ASC",
        NoteSort::TitleAsc => " ORDER BY lower(title) ASC, id ASC",
        NoteSort::TitleDesc => " ORDER BY lower(title) DESC, id DESC",
    }
}

/// Append the WHERE clause shared by the count and page queries.
pub(crate) fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, req: &ListNotesRequest) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(q) = req.search_text() {
        let pattern = format!("%{}%", escape_like(q));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(tag) = req.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        qb.push(" AND ").push_bind(tag.to_string()).push(" = ANY(tags)");
    }
    if let Some(pinned) = req.pinned {
        qb.push(" AND pinned = ").push_bind(pinned);
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notes (id, user_id, title, content, tags, pinned, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(new_v7())
        .bind(user_id)
        .bind(req.title.trim())
        .bind(&req.content)
        .bind(&req.tags)
        .bind(req.pinned)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note_from_row(&row))
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(note_from_row)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn list(&self, user_id: Uuid, req: &ListNotesRequest) -> Result<ListNotesResponse> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notes");
        push_filters(&mut count, user_id, req);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut page = QueryBuilder::<Postgres>::new(format!("SELECT {NOTE_COLUMNS} FROM notes"));
        push_filters(&mut page, user_id, req);
        page.push(order_by(req.sort))
            .push(" LIMIT ")
            .push_bind(req.limit)
            .push(" OFFSET ")
            .push_bind(req.offset);

        let rows = page
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            %user_id,
            result_count = rows.len(),
            total,
            "Listed notes"
        );

        Ok(ListNotesResponse {
            notes: rows.iter().map(note_from_row).collect(),
            total,
        })
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE notes SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(title) = req.title {
            qb.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(content) = req.content {
            qb.push(", content = ").push_bind(content);
        }
        if let Some(tags) = req.tags {
            qb.push(", tags = ").push_bind(tags);
        }
        if let Some(pinned) = req.pinned {
            qb.push(", pinned = ").push_bind(pinned);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING ")
            .push(NOTE_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref()
            .map(note_from_row)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }
}
