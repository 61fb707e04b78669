//! AI run log implementation.
//!
//! Rows are inserted once and never updated; the foreign key on `note_id`
//! removes them when their note is deleted.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use quire_core::{new_v7, AiAction, AiRun, AiRunRepository, Error, Result};

/// PostgreSQL implementation of AiRunRepository.
#[derive(Clone)]
pub struct PgAiRunRepository {
    pool: Pool<Postgres>,
}

impl PgAiRunRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn run_from_row(r: &PgRow) -> Result<AiRun> {
    let action: String = r.get("action");
    Ok(AiRun {
        id: r.get("id"),
        user_id: r.get("user_id"),
        note_id: r.get("note_id"),
        action: action
            .parse::<AiAction>()
            .map_err(|_| Error::Internal(format!("unexpected AI action '{}' in database", action)))?,
        output: r.get("output"),
        created_at: r.get("created_at"),
    })
}

#[async_trait]
impl AiRunRepository for PgAiRunRepository {
    async fn record(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        action: AiAction,
        output: &str,
    ) -> Result<AiRun> {
        let row = sqlx::query(
            r#"
            INSERT INTO note_ai_runs (id, user_id, note_id, action, output, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, note_id, action, output, created_at
            "#,
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(note_id)
        .bind(action.as_str())
        .bind(output)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let run = run_from_row(&row)?;
        debug!(
            subsystem = "db",
            component = "ai_runs",
            op = "record",
            ai_run_id = %run.id,
            %note_id,
            action = action.as_str(),
            "Recorded AI run"
        );
        Ok(run)
    }

    async fn history(&self, user_id: Uuid, note_id: Uuid, limit: i64) -> Result<Vec<AiRun>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, note_id, action, output, created_at
            FROM note_ai_runs
            WHERE note_id = $1 AND user_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(run_from_row).collect()
    }
}
