//! # quire-db
//!
//! PostgreSQL database layer for quire.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, tasks, profiles and AI runs
//! - Embedded migrations (feature `migrations`, default)
//!
//! ## Example
//!
//! ```rust,ignore
//! use quire_db::{CreateNoteRequest, Database, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/quire").await?;
//!     db.migrate().await?;
//!
//!     let user_id = uuid::Uuid::now_v7();
//!     let note = db.notes.insert(user_id, CreateNoteRequest {
//!         title: "Groceries".to_string(),
//!         content: "Milk, eggs".to_string(),
//!         tags: vec!["home".to_string()],
//!         pinned: false,
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```

pub mod ai_runs;
pub mod notes;
pub mod pool;
pub mod profiles;
pub mod tasks;

// Re-export core types
pub use quire_core::*;

pub use ai_runs::PgAiRunRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use profiles::PgProfileRepository;
pub use tasks::PgTaskRepository;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// All repositories over one shared pool.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub notes: PgNoteRepository,
    pub tasks: PgTaskRepository,
    pub profiles: PgProfileRepository,
    pub ai_runs: PgAiRunRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            tasks: PgTaskRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool.clone()),
            ai_runs: PgAiRunRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
