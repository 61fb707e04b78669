//! Task repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use tracing::debug;
use uuid::Uuid;

use quire_core::{
    new_v7, CreateTaskRequest, Error, ListTasksRequest, ListTasksResponse, Result, Task,
    TaskRepository, TaskSort, TaskStatus, UpdateTaskRequest,
};

use crate::escape_like;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, deadline, tags, created_at, updated_at";

/// PostgreSQL implementation of TaskRepository.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
}

impl PgTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn task_from_row(r: &PgRow) -> Result<Task> {
    let status: String = r.get("status");
    Ok(Task {
        id: r.get("id"),
        user_id: r.get("user_id"),
        title: r.get("title"),
        description: r.get("description"),
        status: status
            .parse::<TaskStatus>()
            .map_err(|_| Error::Internal(format!("unexpected task status '{}' in database", status)))?,
        priority: r.get("priority"),
        deadline: r.get("deadline"),
        tags: r.get::<Vec<String>, _>("tags"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

/// ORDER BY clause for a sort key. Missing deadlines sort last either way.
pub(crate) fn order_by(sort: TaskSort) -> &'static str {
    match sort {
        TaskSort::CreatedDesc => " ORDER BY created_at DESC, id DESC",
        TaskSort::CreatedAsc => " ORDER BY created_at ASC, id ASC",
        TaskSort::DeadlineAsc => " ORDER BY deadline ASC NULLS LAST, id ASC",
        TaskSort::DeadlineDesc => " ORDER BY deadline DESC NULLS LAST, id DESC",
        TaskSort::PriorityDesc => " ORDER BY priority DESC, created_at DESC, id DESC",
        TaskSort::PriorityAsc => " ORDER BY priority ASC, created_at DESC, id DESC",
    }
}

pub(crate) fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, req: &ListTasksRequest) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(q) = req.search_text() {
        let pattern = format!("%{}%", escape_like(q));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = req.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = req.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, user_id: Uuid, req: CreateTaskRequest) -> Result<Task> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tasks (id, user_id, title, description, status, priority, deadline, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(new_v7())
        .bind(user_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.status.as_str())
        .bind(req.priority)
        .bind(req.deadline)
        .bind(&req.tags)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        task_from_row(&row)
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Task> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => task_from_row(&row),
            None => Err(Error::TaskNotFound(id)),
        }
    }

    async fn list(&self, user_id: Uuid, req: &ListTasksRequest) -> Result<ListTasksResponse> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filters(&mut count, user_id, req);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut page = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
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
            component = "tasks",
            op = "list",
            %user_id,
            result_count = rows.len(),
            total,
            "Listed tasks"
        );

        let tasks = rows.iter().map(task_from_row).collect::<Result<Vec<_>>>()?;
        Ok(ListTasksResponse { tasks, total })
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateTaskRequest) -> Result<Task> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(title) = req.title {
            qb.push(", title = ").push_bind(title.trim().to_string());
        }
        // Some(None) clears the column.
        if let Some(description) = req.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(status) = req.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(priority) = req.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(deadline) = req.deadline {
            qb.push(", deadline = ").push_bind(deadline);
        }
        if let Some(tags) = req.tags {
            qb.push(", tags = ").push_bind(tags);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => task_from_row(&row),
            None => Err(Error::TaskNotFound(id)),
        }
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TaskNotFound(id));
        }
        Ok(())
    }
}
