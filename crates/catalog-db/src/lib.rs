//! # catalog-db
//!
//! Storage layer for the resource catalog.
//!
//! This crate provides:
//! - Connection pool management
//! - The PostgreSQL resource repository with transactional tag reconciliation
//! - An in-memory repository with the same semantics
//! - Embedded schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalog_db::{Database, NewResource, PoolConfig, ResourceRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect_with_config("postgres://localhost/catalog", PoolConfig::default()).await?;
//!     db.migrate().await?;
//!
//!     let resource = db.resources.insert(NewResource {
//!         id: catalog_db::new_v7(),
//!         name: "Build server".to_string(),
//!         description: None,
//!         created_at: chrono::Utc::now(),
//!         tag_labels: vec!["infra".to_string()],
//!     }).await?;
//!
//!     println!("Created resource: {}", resource.id);
//!     Ok(())
//! }
//! ```
pub mod memory;
pub mod pool;
pub mod resources;
pub mod tags;

// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use catalog_core::*;

pub use memory::MemoryResourceRepository;
pub use pool::{create_pool_with_config, PoolConfig};
pub use resources::PgResourceRepository;

/// SQLSTATEs for transactions PostgreSQL aborted because of concurrent
/// writers: `serialization_failure` and `deadlock_detected`.
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// Convert a sqlx error into a catalog error.
///
/// Unique-constraint violations and transactions aborted by a concurrent
/// writer become [`Error::Conflict`] so callers can retry the command;
/// everything else stays a database error.
pub fn map_db_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!(
                "Unique constraint violated: {}",
                db_err.constraint().unwrap_or("unknown")
            ));
        }
        if let Some(code) = db_err.code() {
            if RETRYABLE_SQLSTATES.contains(&&*code) {
                return Error::Conflict(format!(
                    "Transaction aborted by concurrent writer ({}): {}",
                    code,
                    db_err.message()
                ));
            }
        }
    }
    Error::Database(err)
}

/// Combined database access with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Resource repository for CRUD operations.
    pub resources: PgResourceRepository,
}

impl Database {
    /// Create a new database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            resources: PgResourceRepository::new(pool.clone()),
            pool,
        }
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
}
