//! Core traits for notegraph storage abstractions.
//!
//! These traits define the interfaces that storage backends must satisfy.
//! The PostgreSQL backend lives in `notegraph-db`; an in-memory backend for
//! tests lives in `notegraph-links`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Repository for note CRUD operations.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by ID. Fails with `NoteNotFound` when absent.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// Fetch every note in `ids` that exists. Missing ids are skipped.
    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<Note>>;

    /// Find a note by exact, case-sensitive title.
    ///
    /// Titles are not unique; the oldest match wins.
    async fn find_by_title(&self, title: &str) -> Result<Option<Note>>;

    /// List notes matching a filter, oldest first.
    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>>;

    /// Apply a partial update.
    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Delete a note. Links from and to it are removed with it.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Check if a note exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// LINK REPOSITORY TRAITS
// =============================================================================

/// Repository for link storage and retrieval.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Create a link. Fails with `UniqueConstraint` on a duplicate triple.
    async fn create(&self, req: CreateLinkRequest) -> Result<NoteLink>;

    /// Fetch a link by ID. Fails with `LinkNotFound` when absent.
    async fn get(&self, id: Uuid) -> Result<NoteLink>;

    /// Apply a partial update. Fails with `UniqueConstraint` on a duplicate triple.
    async fn update(&self, id: Uuid, req: UpdateLinkRequest) -> Result<NoteLink>;

    /// Delete a link. Fails with `LinkNotFound` when absent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All links whose source is `note_id`, in creation order.
    async fn list_by_source(&self, note_id: Uuid) -> Result<Vec<NoteLink>>;

    /// All links whose target is `note_id`, in creation order.
    async fn list_by_target(&self, note_id: Uuid) -> Result<Vec<NoteLink>>;

    /// Number of incoming links for each note in `note_ids`.
    ///
    /// Notes without incoming links map to zero.
    async fn count_by_targets(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    /// Outgoing links with their target notes, newest first.
    async fn get_outgoing(&self, note_id: Uuid, limit: i64) -> Result<Vec<LinkedNote>>;

    /// Incoming links with their source notes, newest first.
    async fn get_backlinks(
        &self,
        note_id: Uuid,
        limit: i64,
        exclude_archived: bool,
    ) -> Result<Vec<LinkedNote>>;
}

// =============================================================================
// TAG AND FOLDER REPOSITORY TRAITS
// =============================================================================

/// Repository for tag operations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag, or return the existing one with the same name.
    async fn create(&self, name: &str) -> Result<Tag>;

    /// List all tags.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Assign a tag to a note. Assigning twice is a no-op.
    async fn add_to_note(&self, note_id: Uuid, tag_id: Uuid) -> Result<()>;

    /// Remove a tag from a note.
    async fn remove_from_note(&self, note_id: Uuid, tag_id: Uuid) -> Result<()>;

    /// Tag ids assigned to a note.
    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Uuid>>;

    /// Tag ids for each note in `note_ids`. Untagged notes may be absent.
    async fn get_for_notes(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>>;
}

/// Repository for folder operations.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Create a folder.
    async fn create(&self, name: &str) -> Result<Folder>;

    /// List all folders.
    async fn list(&self) -> Result<Vec<Folder>>;
}

// =============================================================================
// LINK SYNC TRAITS
// =============================================================================

/// Unit of work for rewriting a note's outgoing links.
///
/// Dropping the transaction without calling [`commit`](Self::commit)
/// discards every change made through it.
#[async_trait]
pub trait LinkSyncTransaction: Send {
    /// Find a note by exact title, oldest match first.
    async fn find_note_by_title(&mut self, title: &str) -> Result<Option<Note>>;

    /// Insert a note.
    async fn insert_note(&mut self, req: CreateNoteRequest) -> Result<Note>;

    /// Delete every link whose source is `note_id`. Returns the count removed.
    async fn delete_links_by_source(&mut self, note_id: Uuid) -> Result<u64>;

    /// Create a link. Fails with `UniqueConstraint` on a duplicate triple
    /// without poisoning the transaction.
    async fn create_link(&mut self, req: CreateLinkRequest) -> Result<NoteLink>;

    /// Make every change visible. The transaction is spent afterwards.
    async fn commit(&mut self) -> Result<()>;
}

/// Opens [`LinkSyncTransaction`]s.
#[async_trait]
pub trait LinkSyncStore: Send + Sync {
    async fn begin_sync(&self) -> Result<Box<dyn LinkSyncTransaction>>;
}

// =============================================================================
// STORE BUNDLE
// =============================================================================

/// Handles to every repository a backend provides.
#[derive(Clone)]
pub struct NoteStore {
    pub notes: Arc<dyn NoteRepository>,
    pub links: Arc<dyn LinkRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub sync: Arc<dyn LinkSyncStore>,
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore").finish_non_exhaustive()
    }
}
