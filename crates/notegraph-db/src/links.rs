//! Link repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

use notegraph_core::{
    new_v7, CreateLinkRequest, Error, LinkRepository, LinkedNote, NoteLink, NoteSummary, Result,
    UpdateLinkRequest,
};

const LINK_COLUMNS: &str = "id, source_note_id, target_note_id, link_text, context, created_at_utc";

pub(crate) fn link_from_row(row: &PgRow) -> NoteLink {
    NoteLink {
        id: row.get("id"),
        source_note_id: row.get("source_note_id"),
        target_note_id: row.get("target_note_id"),
        link_text: row.get("link_text"),
        context: row.get("context"),
        created_at_utc: row.get("created_at_utc"),
    }
}

/// Map a link joined with the note on its other end (columns prefixed `n_`).
fn linked_note_from_row(row: &PgRow) -> LinkedNote {
    let content: String = row.get("n_content");
    LinkedNote {
        link: link_from_row(row),
        note: NoteSummary {
            id: row.get("n_id"),
            title: row.get("n_title"),
            is_pinned: row.get("n_is_pinned"),
            is_favorite: row.get("n_is_favorite"),
            is_archived: row.get("n_is_archived"),
            is_phantom: content.is_empty(),
            updated_at_utc: row.get("n_updated_at_utc"),
        },
    }
}

fn duplicate_triple(source: Uuid, target: Uuid, link_text: &str) -> Error {
    Error::UniqueConstraint(format!("{} -> {} ({})", source, target, link_text))
}

/// PostgreSQL implementation of LinkRepository.
#[derive(Clone)]
pub struct PgLinkRepository {
    pool: Pool<Postgres>,
}

impl PgLinkRepository {
    /// Create a new PgLinkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn list_where(&self, column: &str, note_id: Uuid) -> Result<Vec<NoteLink>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM note_link WHERE {column} = $1 ORDER BY created_at_utc, id"
        ))
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(link_from_row).collect())
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, req: CreateLinkRequest) -> Result<NoteLink> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let link = self.create_tx(&mut tx, req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(link)
    }

    async fn get(&self, id: Uuid) -> Result<NoteLink> {
        let row = sqlx::query(&format!("SELECT {LINK_COLUMNS} FROM note_link WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref()
            .map(link_from_row)
            .ok_or(Error::LinkNotFound(id))
    }

    async fn update(&self, id: Uuid, req: UpdateLinkRequest) -> Result<NoteLink> {
        if req.link_text.is_none() && req.context.is_none() {
            return self.get(id).await;
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE note_link SET ");
        let mut fields = query.separated(", ");
        if let Some(link_text) = &req.link_text {
            fields.push("link_text = ").push_bind_unseparated(link_text.clone());
        }
        if let Some(context) = &req.context {
            fields.push("context = ").push_bind_unseparated(context.clone());
        }
        query.push(" WHERE id = ").push_bind(id);
        query.push(format!(" RETURNING {LINK_COLUMNS}"));

        let row = query
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                let err = Error::Database(e);
                if err.is_unique_violation() {
                    Error::UniqueConstraint(format!(
                        "link {} ({})",
                        id,
                        req.link_text.as_deref().unwrap_or_default()
                    ))
                } else {
                    err
                }
            })?;

        row.as_ref()
            .map(link_from_row)
            .ok_or(Error::LinkNotFound(id))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note_link WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::LinkNotFound(id));
        }
        Ok(())
    }

    async fn list_by_source(&self, note_id: Uuid) -> Result<Vec<NoteLink>> {
        self.list_where("source_note_id", note_id).await
    }

    async fn list_by_target(&self, note_id: Uuid) -> Result<Vec<NoteLink>> {
        self.list_where("target_note_id", note_id).await
    }

    async fn count_by_targets(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let mut counts: HashMap<Uuid, i64> = note_ids.iter().map(|id| (*id, 0)).collect();
        if note_ids.is_empty() {
            return Ok(counts);
        }

        let rows = sqlx::query(
            "SELECT target_note_id, COUNT(*) AS incoming
             FROM note_link
             WHERE target_note_id = ANY($1)
             GROUP BY target_note_id",
        )
        .bind(note_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        for row in rows {
            counts.insert(row.get("target_note_id"), row.get("incoming"));
        }
        Ok(counts)
    }

    async fn get_outgoing(&self, note_id: Uuid, limit: i64) -> Result<Vec<LinkedNote>> {
        let rows = sqlx::query(
            r#"SELECT
                l.id, l.source_note_id, l.target_note_id, l.link_text, l.context, l.created_at_utc,
                n.id AS n_id, n.title AS n_title, n.content AS n_content,
                n.is_pinned AS n_is_pinned, n.is_favorite AS n_is_favorite,
                n.is_archived AS n_is_archived, n.updated_at_utc AS n_updated_at_utc
               FROM note_link l
               JOIN note n ON n.id = l.target_note_id
               WHERE l.source_note_id = $1
               ORDER BY l.created_at_utc DESC, l.id DESC
               LIMIT $2"#,
        )
        .bind(note_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(linked_note_from_row).collect())
    }

    async fn get_backlinks(
        &self,
        note_id: Uuid,
        limit: i64,
        exclude_archived: bool,
    ) -> Result<Vec<LinkedNote>> {
        let rows = sqlx::query(
            r#"SELECT
                l.id, l.source_note_id, l.target_note_id, l.link_text, l.context, l.created_at_utc,
                n.id AS n_id, n.title AS n_title, n.content AS n_content,
                n.is_pinned AS n_is_pinned, n.is_favorite AS n_is_favorite,
                n.is_archived AS n_is_archived, n.updated_at_utc AS n_updated_at_utc
               FROM note_link l
               JOIN note n ON n.id = l.source_note_id
               WHERE l.target_note_id = $1
                 AND (NOT $2 OR NOT n.is_archived)
               ORDER BY l.created_at_utc DESC, l.id DESC
               LIMIT $3"#,
        )
        .bind(note_id)
        .bind(exclude_archived)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(linked_note_from_row).collect())
    }
}

// =============================================================================
// TRANSACTION-AWARE VARIANTS
// =============================================================================

impl PgLinkRepository {
    /// Create a link within an existing transaction.
    ///
    /// A duplicate (source, target, link text) triple is reported as
    /// `UniqueConstraint` without raising a database error, so the
    /// surrounding transaction stays usable.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: CreateLinkRequest,
    ) -> Result<NoteLink> {
        let row = sqlx::query(&format!(
            "INSERT INTO note_link (id, source_note_id, target_note_id, link_text, context, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT note_link_triple_key DO NOTHING
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(new_v7())
        .bind(req.source_note_id)
        .bind(req.target_note_id)
        .bind(&req.link_text)
        .bind(&req.context)
        .bind(Utc::now())
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(link_from_row(&row)),
            None => Err(duplicate_triple(
                req.source_note_id,
                req.target_note_id,
                &req.link_text,
            )),
        }
    }

    /// Delete every link whose source is `note_id` within an existing transaction.
    pub async fn delete_by_source_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM note_link WHERE source_note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
