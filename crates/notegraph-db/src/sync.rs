//! Transactional link synchronization for PostgreSQL.
//!
//! A [`PgSyncTransaction`] wraps one database transaction. Phantom note
//! creation, outgoing-link teardown, and link re-creation all run through
//! it, so a failed sync leaves the previous link set in place.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use notegraph_core::{
    CreateLinkRequest, CreateNoteRequest, Error, LinkSyncStore, LinkSyncTransaction, Note,
    NoteLink, Result,
};

use crate::links::PgLinkRepository;
use crate::notes::PgNoteRepository;

fn spent() -> Error {
    Error::Internal("sync transaction already committed".to_string())
}

/// Opens PostgreSQL-backed sync transactions.
#[derive(Clone)]
pub struct PgLinkSyncStore {
    pool: Pool<Postgres>,
    notes: PgNoteRepository,
    links: PgLinkRepository,
}

impl PgLinkSyncStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            links: PgLinkRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl LinkSyncStore for PgLinkSyncStore {
    async fn begin_sync(&self) -> Result<Box<dyn LinkSyncTransaction>> {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        Ok(Box::new(PgSyncTransaction {
            tx: Some(tx),
            notes: self.notes.clone(),
            links: self.links.clone(),
        }))
    }
}

/// An open sync transaction. Rolled back on drop unless committed.
pub struct PgSyncTransaction {
    tx: Option<Transaction<'static, Postgres>>,
    notes: PgNoteRepository,
    links: PgLinkRepository,
}

#[async_trait]
impl LinkSyncTransaction for PgSyncTransaction {
    async fn find_note_by_title(&mut self, title: &str) -> Result<Option<Note>> {
        let Self { tx, notes, .. } = self;
        let tx = tx.as_mut().ok_or_else(spent)?;
        notes.find_by_title_tx(tx, title).await
    }

    async fn insert_note(&mut self, req: CreateNoteRequest) -> Result<Note> {
        let Self { tx, notes, .. } = self;
        let tx = tx.as_mut().ok_or_else(spent)?;
        notes.insert_tx(tx, req).await
    }

    async fn delete_links_by_source(&mut self, note_id: Uuid) -> Result<u64> {
        let Self { tx, links, .. } = self;
        let tx = tx.as_mut().ok_or_else(spent)?;
        links.delete_by_source_tx(tx, note_id).await
    }

    async fn create_link(&mut self, req: CreateLinkRequest) -> Result<NoteLink> {
        let Self { tx, links, .. } = self;
        let tx = tx.as_mut().ok_or_else(spent)?;
        links.create_tx(tx, req).await
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or_else(spent)?;
        tx.commit().await.map_err(Error::Database)
    }
}
