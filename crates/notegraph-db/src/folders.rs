//! Folder repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use notegraph_core::{new_v7, Error, Folder, FolderRepository, Result};

/// PostgreSQL implementation of FolderRepository.
#[derive(Clone)]
pub struct PgFolderRepository {
    pool: Pool<Postgres>,
}

impl PgFolderRepository {
    /// Create a new PgFolderRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn create(&self, name: &str) -> Result<Folder> {
        let row = sqlx::query(
            "INSERT INTO folder (id, name, created_at_utc) VALUES ($1, $2, $3)
             RETURNING id, name, created_at_utc",
        )
        .bind(new_v7())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Folder {
            id: row.get("id"),
            name: row.get("name"),
            created_at_utc: row.get("created_at_utc"),
        })
    }

    async fn list(&self) -> Result<Vec<Folder>> {
        let rows = sqlx::query("SELECT id, name, created_at_utc FROM folder ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Folder {
                id: row.get("id"),
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect())
    }
}
