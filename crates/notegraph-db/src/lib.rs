//! # notegraph-db
//!
//! PostgreSQL storage layer for notegraph.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, links, tags, and folders
//! - Transactional link synchronization ([`PgLinkSyncStore`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use notegraph_db::{Database, NoteRepository, CreateNoteRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notegraph").await?;
//!     db.migrate().await?;
//!
//!     let note = db.notes.insert(CreateNoteRequest {
//!         title: "Hello".to_string(),
//!         content: "See [[World]]".to_string(),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```
pub mod folders;
pub mod links;
pub mod notes;
pub mod pool;
pub mod sync;
pub mod tags;
#[cfg(feature = "migrations")]
pub mod test_fixtures;

use std::sync::Arc;

pub use folders::PgFolderRepository;
pub use links::PgLinkRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use sync::{PgLinkSyncStore, PgSyncTransaction};
pub use tags::PgTagRepository;

// Re-export core types for convenience
pub use notegraph_core::*;

/// Database handle aggregating every repository.
#[derive(Clone)]
pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository.
    pub notes: PgNoteRepository,
    /// Link repository.
    pub links: PgLinkRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// Folder repository.
    pub folders: PgFolderRepository,
    /// Opens transactions for link synchronization.
    pub sync: PgLinkSyncStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            links: PgLinkRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            folders: PgFolderRepository::new(pool.clone()),
            sync: PgLinkSyncStore::new(pool.clone()),
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

    /// Backend-agnostic handles to every repository.
    pub fn store(&self) -> NoteStore {
        NoteStore {
            notes: Arc::new(self.notes.clone()),
            links: Arc::new(self.links.clone()),
            tags: Arc::new(self.tags.clone()),
            folders: Arc::new(self.folders.clone()),
            sync: Arc::new(self.sync.clone()),
        }
    }
}
