//! Profile repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quire_core::{Error, Profile, ProfileRepository, Result, Theme, UpdateProfileRequest};

/// PostgreSQL implementation of ProfileRepository.
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: Pool<Postgres>,
}

impl PgProfileRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn ensure_exists(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("INSERT INTO profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

fn profile_from_row(r: &PgRow) -> Result<Profile> {
    let theme: String = r.get("theme");
    Ok(Profile {
        id: r.get("id"),
        full_name: r.get("full_name"),
        theme: theme
            .parse::<Theme>()
            .map_err(|_| Error::Internal(format!("unexpected theme '{}' in database", theme)))?,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn fetch_or_create(&self, user_id: Uuid) -> Result<Profile> {
        self.ensure_exists(user_id).await?;
        let row = sqlx::query(
            "SELECT id, full_name, theme, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        profile_from_row(&row)
    }

    async fn update(&self, user_id: Uuid, req: UpdateProfileRequest) -> Result<Profile> {
        self.ensure_exists(user_id).await?;
        let row = sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                theme = COALESCE($3, theme),
                updated_at = now()
            WHERE id = $1
            RETURNING id, full_name, theme, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(req.full_name.as_deref().map(str::trim))
        .bind(req.theme.map(|t| t.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        profile_from_row(&row)
    }
}
