//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

use notegraph_core::{
    new_v7, CreateNoteRequest, Error, ListNotesRequest, Note, NoteRepository, Result,
    UpdateNoteRequest,
};

const NOTE_COLUMNS: &str = "id, title, content, is_pinned, is_favorite, is_archived, folder_id, \
                            created_at_utc, updated_at_utc";

/// Map a foreign key violation to `NotFound`; other errors pass through.
pub(crate) fn missing_reference(e: sqlx::Error, what: impl FnOnce() -> String) -> Error {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            Error::NotFound(what())
        }
        _ => Error::Database(e),
    }
}

pub(crate) fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        is_pinned: row.get("is_pinned"),
        is_favorite: row.get("is_favorite"),
        is_archived: row.get("is_archived"),
        folder_id: row.get("folder_id"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = self.insert_tx(&mut tx, req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {NOTE_COLUMNS} FROM note WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref()
            .map(note_from_row)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<Note>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE id = ANY($1) ORDER BY created_at_utc, id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = self.find_by_title_tx(&mut tx, title).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE TRUE"
        ));
        if let Some(exclude_id) = req.exclude_id {
            query.push(" AND id <> ").push_bind(exclude_id);
        }
        if req.exclude_archived {
            query.push(" AND is_archived = FALSE");
        }
        if req.phantom_only {
            query.push(" AND content = ''");
        }
        query.push(" ORDER BY created_at_utc, id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE note SET updated_at_utc = ");
        query.push_bind(Utc::now());

        if let Some(title) = req.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(content) = req.content {
            query.push(", content = ").push_bind(content);
        }
        if let Some(is_pinned) = req.is_pinned {
            query.push(", is_pinned = ").push_bind(is_pinned);
        }
        if let Some(is_favorite) = req.is_favorite {
            query.push(", is_favorite = ").push_bind(is_favorite);
        }
        if let Some(is_archived) = req.is_archived {
            query.push(", is_archived = ").push_bind(is_archived);
        }
        if let Some(folder_id) = req.folder_id {
            query.push(", folder_id = ").push_bind(folder_id);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(format!(" RETURNING {NOTE_COLUMNS}"));

        let folder_id = req.folder_id.flatten();
        let row = query
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                missing_reference(e, || format!("Folder {}", folder_id.unwrap_or_default()))
            })?;

        row.as_ref()
            .map(note_from_row)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM note WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }
}

// =============================================================================
// TRANSACTION-AWARE VARIANTS
// =============================================================================

/// Transaction-aware variants used by link synchronization, where phantom
/// note creation must commit or roll back together with the link rewrite.
impl PgNoteRepository {
    /// Insert a note within an existing transaction.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: CreateNoteRequest,
    ) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO note (id, title, content, is_pinned, is_favorite, is_archived, folder_id, \
             created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(new_v7())
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.is_pinned)
        .bind(req.is_favorite)
        .bind(req.is_archived)
        .bind(req.folder_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            missing_reference(e, || format!("Folder {}", req.folder_id.unwrap_or_default()))
        })?;

        Ok(note_from_row(&row))
    }

    /// Find the oldest note with exactly this title within an existing transaction.
    pub async fn find_by_title_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        title: &str,
    ) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE title = $1 ORDER BY created_at_utc, id LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(note_from_row))
    }
}
