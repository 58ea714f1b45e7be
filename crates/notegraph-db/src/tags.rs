//! Tag repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notegraph_core::{new_v7, Error, Result, Tag, TagRepository};

use crate::notes::missing_reference;

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Tag name cannot be empty".to_string()));
        }

        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(
            "INSERT INTO tag (id, name, created_at_utc) VALUES ($1, $2, $3)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name, created_at_utc",
        )
        .bind(new_v7())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Tag {
            id: row.get("id"),
            name: row.get("name"),
            created_at_utc: row.get("created_at_utc"),
        })
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, created_at_utc FROM tag ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect())
    }

    async fn add_to_note(&self, note_id: Uuid, tag_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO note_tag (note_id, tag_id, created_at_utc) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(note_id)
        .bind(tag_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| missing_reference(e, || format!("Note {} or tag {}", note_id, tag_id)))?;
        Ok(())
    }

    async fn remove_from_note(&self, note_id: Uuid, tag_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1 AND tag_id = $2")
            .bind(note_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT tag_id FROM note_tag WHERE note_id = $1 ORDER BY tag_id")
            .bind(note_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|r| r.get("tag_id")).collect())
    }

    async fn get_for_notes(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        if note_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT note_id, tag_id FROM note_tag WHERE note_id = ANY($1) ORDER BY note_id, tag_id",
        )
        .bind(note_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut tags: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in rows {
            tags.entry(row.get("note_id"))
                .or_default()
                .push(row.get("tag_id"));
        }
        Ok(tags)
    }
}
