//! Entry points for request handlers.
//!
//! [`LinkService`] ties the synchronizer, scorer, and detector to one store
//! and one lock registry. Saving a note through it re-syncs the note's
//! links; explicit link edits take the same per-note lock as sync.

use tracing::{debug, info, instrument};
use uuid::Uuid;

use notegraph_core::defaults::{BACKLINK_LIMIT, BACKLINK_LIMIT_MAX, OUTGOING_LIMIT, OUTGOING_LIMIT_MAX};
use notegraph_core::{
    extract_keywords, extract_links, BacklinksOptions, BrokenLink, CreateLinkRequest,
    CreateNoteRequest, Error, LinkPreview, LinkedNote, ListNotesRequest, NewLinkRequest, Note,
    NoteLink, NoteStore, OutgoingLinksOptions, RedLinkNote, RelatedNote, RelatedNotesOptions,
    Result, SyncReport, UpdateLinkRequest, UpdateNoteRequest,
};

use crate::broken::BrokenLinkDetector;
use crate::locks::NoteLocks;
use crate::related::RelatedNotesScorer;
use crate::sync::{resolve_or_create_target, LinkSynchronizer};

/// A persisted note and the link sync its save triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedNote {
    pub note: Note,
    /// `None` when the save did not touch content.
    pub sync: Option<SyncReport>,
}

/// Non-positive limits fall back to the default; others are capped.
pub fn clamp_limit(limit: i64, default: i64, max: i64) -> i64 {
    if limit <= 0 {
        default
    } else {
        limit.min(max)
    }
}

/// Parse content for links and keywords without touching any store.
pub fn preview(content: &str) -> LinkPreview {
    LinkPreview {
        links: extract_links(content),
        keywords: extract_keywords(content),
    }
}

/// Note-linking operations over one store.
#[derive(Clone)]
pub struct LinkService {
    store: NoteStore,
    synchronizer: LinkSynchronizer,
    scorer: RelatedNotesScorer,
    detector: BrokenLinkDetector,
}

impl LinkService {
    pub fn new(store: NoteStore) -> Self {
        Self {
            synchronizer: LinkSynchronizer::with_locks(store.clone(), NoteLocks::new()),
            scorer: RelatedNotesScorer::new(store.clone()),
            detector: BrokenLinkDetector::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    fn locks(&self) -> &NoteLocks {
        self.synchronizer.locks()
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    pub async fn get_note(&self, id: Uuid) -> Result<Note> {
        self.store.notes.fetch(id).await
    }

    pub async fn list_notes(&self, req: ListNotesRequest) -> Result<Vec<Note>> {
        self.store.notes.list(req).await
    }

    /// Persist a note, then sync links from its content.
    pub async fn create_note(&self, req: CreateNoteRequest) -> Result<SavedNote> {
        if req.title.trim().is_empty() {
            return Err(Error::InvalidInput("title is required".to_string()));
        }
        let inserted = self.store.notes.insert(req).await?;
        let _guard = self.locks().lock(inserted.id).await;
        // An update may have landed between insert and lock
        let note = self.store.notes.fetch(inserted.id).await?;
        let report = self.synchronizer.sync_locked(note.id, &note.content).await?;
        info!(
            subsystem = "links",
            op = "create_note",
            note_id = %note.id,
            "Note created"
        );
        Ok(SavedNote {
            note,
            sync: Some(report),
        })
    }

    /// Apply a partial update. Links are re-synced when content is provided.
    pub async fn update_note(&self, id: Uuid, req: UpdateNoteRequest) -> Result<SavedNote> {
        if matches!(&req.title, Some(title) if title.trim().is_empty()) {
            return Err(Error::InvalidInput("title cannot be empty".to_string()));
        }
        let content_changed = req.content.is_some();
        // Content write and link rebuild happen under one guard
        let _guard = self.locks().lock(id).await;
        let note = self.store.notes.update(id, req).await?;
        let sync = if content_changed {
            Some(self.synchronizer.sync_locked(id, &note.content).await?)
        } else {
            None
        };
        Ok(SavedNote { note, sync })
    }

    /// Delete a note together with every link from or to it.
    pub async fn delete_note(&self, id: Uuid) -> Result<()> {
        let _guard = self.locks().lock(id).await;
        self.store.notes.delete(id).await
    }

    // =========================================================================
    // LINK SYNC AND EDITING
    // =========================================================================

    pub async fn sync(&self, note_id: Uuid, content: &str) -> Result<SyncReport> {
        self.synchronizer.sync(note_id, content).await
    }

    /// Create one link by target title without re-syncing the source.
    ///
    /// The target is created as a phantom note when missing. A duplicate
    /// (source, target, link text) triple fails with `UniqueConstraint`, and
    /// any phantom created for it is discarded.
    #[instrument(skip(self, req), fields(
        subsystem = "links",
        component = "links",
        op = "create_link",
        note_id = %req.source_id,
    ))]
    pub async fn create_link(&self, req: NewLinkRequest) -> Result<NoteLink> {
        let target_title = req.target_title.trim();
        if target_title.is_empty() {
            return Err(Error::InvalidInput("targetTitle is required".to_string()));
        }
        let link_text = req
            .link_text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| target_title.to_string());
        let context = req.context.filter(|c| !c.is_empty());

        let _guard = self.locks().lock(req.source_id).await;
        if !self.store.notes.exists(req.source_id).await? {
            return Err(Error::NoteNotFound(req.source_id));
        }

        let mut tx = self.store.sync.begin_sync().await?;
        let target = resolve_or_create_target(tx.as_mut(), target_title).await?;
        let link = tx
            .create_link(CreateLinkRequest {
                source_note_id: req.source_id,
                target_note_id: target.note.id,
                link_text,
                context,
            })
            .await?;
        tx.commit().await?;

        debug!(
            link_id = %link.id,
            phantom_created = target.created,
            "Link created"
        );
        Ok(link)
    }

    /// Change a link's text or context. Only provided fields change.
    pub async fn update_link(&self, id: Uuid, req: UpdateLinkRequest) -> Result<NoteLink> {
        let current = self.store.links.get(id).await?;
        let _guard = self.locks().lock(current.source_note_id).await;
        self.store.links.update(id, req).await
    }

    pub async fn delete_link(&self, id: Uuid) -> Result<()> {
        let current = self.store.links.get(id).await?;
        let _guard = self.locks().lock(current.source_note_id).await;
        self.store.links.delete(id).await
    }

    // =========================================================================
    // LISTINGS
    // =========================================================================

    /// Links from `note_id`, newest first, each with its target note.
    pub async fn outgoing(
        &self,
        note_id: Uuid,
        options: OutgoingLinksOptions,
    ) -> Result<Vec<LinkedNote>> {
        if !self.store.notes.exists(note_id).await? {
            return Err(Error::NoteNotFound(note_id));
        }
        let limit = clamp_limit(options.limit, OUTGOING_LIMIT, OUTGOING_LIMIT_MAX);
        let mut links = self.store.links.get_outgoing(note_id, limit).await?;
        if !options.include_context {
            strip_context(&mut links);
        }
        Ok(links)
    }

    /// Links to `note_id`, newest first, each with its source note.
    pub async fn backlinks(
        &self,
        note_id: Uuid,
        options: BacklinksOptions,
    ) -> Result<Vec<LinkedNote>> {
        if !self.store.notes.exists(note_id).await? {
            return Err(Error::NoteNotFound(note_id));
        }
        let limit = clamp_limit(options.limit, BACKLINK_LIMIT, BACKLINK_LIMIT_MAX);
        let mut links = self
            .store
            .links
            .get_backlinks(note_id, limit, options.exclude_archived)
            .await?;
        if !options.include_context {
            strip_context(&mut links);
        }
        Ok(links)
    }

    // =========================================================================
    // SCORING AND DETECTION
    // =========================================================================

    pub async fn related(
        &self,
        note_id: Uuid,
        options: RelatedNotesOptions,
    ) -> Result<Vec<RelatedNote>> {
        if !options.threshold.is_finite() {
            return Err(Error::InvalidInput("threshold must be a number".to_string()));
        }
        self.scorer.get_related(note_id, options).await
    }

    pub async fn broken_links(&self, note_id: Uuid) -> Result<Vec<BrokenLink>> {
        self.detector.find_broken_links(note_id).await
    }

    pub async fn red_link_notes(&self) -> Result<Vec<RedLinkNote>> {
        self.detector.find_red_link_notes().await
    }
}

fn strip_context(links: &mut [LinkedNote]) {
    for linked in links {
        linked.link.context = None;
    }
}
