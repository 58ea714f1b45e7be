//! Link synchronization: makes a note's persisted outgoing links match the
//! wiki-links in its content.
//!
//! A sync is a full teardown and rebuild, not a diff. Every outgoing link of
//! the note is deleted, then one link is created per extracted wiki-link in
//! extraction order. Targets that do not exist yet are created as phantom
//! notes. All of it runs in one store transaction.

use std::time::Instant;

use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use notegraph_core::{
    extract_links, CreateLinkRequest, CreateNoteRequest, Error, LinkSyncTransaction, Note,
    NoteStore, ParsedLink, Result, SyncReport,
};

use crate::locks::NoteLocks;

/// A link target looked up by title.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub note: Note,
    /// True when the note did not exist and was created as a phantom.
    pub created: bool,
}

/// Look up the note titled `title`, creating a phantom note if there is none.
///
/// Lookup is exact and case-sensitive. When several notes share the title
/// the oldest one is used.
pub async fn resolve_or_create_target(
    tx: &mut dyn LinkSyncTransaction,
    title: &str,
) -> Result<ResolvedTarget> {
    if let Some(note) = tx.find_note_by_title(title).await? {
        trace!(target_title = title, note_id = %note.id, "Resolved link target");
        return Ok(ResolvedTarget {
            note,
            created: false,
        });
    }

    let note = tx.insert_note(CreateNoteRequest::phantom(title)).await?;
    debug!(
        target_title = title,
        note_id = %note.id,
        "Created phantom note for unresolved link target"
    );
    Ok(ResolvedTarget {
        note,
        created: true,
    })
}

/// Rewrites a note's outgoing links from its content.
#[derive(Clone)]
pub struct LinkSynchronizer {
    store: NoteStore,
    locks: NoteLocks,
}

impl LinkSynchronizer {
    pub fn new(store: NoteStore) -> Self {
        Self::with_locks(store, NoteLocks::new())
    }

    /// Share a lock registry with other writers of note links.
    pub fn with_locks(store: NoteStore, locks: NoteLocks) -> Self {
        Self { store, locks }
    }

    pub fn locks(&self) -> &NoteLocks {
        &self.locks
    }

    /// Make `note_id`'s outgoing links exactly the wiki-links in `content`.
    ///
    /// Repeating a sync with the same content yields the same link set. Two
    /// wiki-links producing the same (source, target, link text) triple
    /// persist once; the repeat is counted in `skipped_duplicates`. Any other
    /// store failure aborts the sync and leaves the previous links intact.
    pub async fn sync(&self, note_id: Uuid, content: &str) -> Result<SyncReport> {
        let _guard = self.locks.lock(note_id).await;
        self.sync_locked(note_id, content).await
    }

    /// Sync without taking the note's lock. The caller must already hold it.
    #[instrument(skip(self, content), fields(
        subsystem = "links",
        component = "sync",
        op = "sync",
        note_id = %note_id,
        content_len = content.len(),
    ))]
    pub(crate) async fn sync_locked(&self, note_id: Uuid, content: &str) -> Result<SyncReport> {
        let start = Instant::now();

        if !self.store.notes.exists(note_id).await? {
            return Err(Error::NoteNotFound(note_id));
        }

        let parsed = extract_links(content);
        let mut tx = self.store.sync.begin_sync().await?;
        let report = rebuild_links(tx.as_mut(), note_id, &parsed).await?;
        tx.commit().await?;

        info!(
            extracted_count = report.extracted,
            created_count = report.created,
            skipped_count = report.skipped_duplicates,
            phantom_count = report.phantom_notes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Link sync completed"
        );
        Ok(report)
    }
}

async fn rebuild_links(
    tx: &mut dyn LinkSyncTransaction,
    note_id: Uuid,
    parsed: &[ParsedLink],
) -> Result<SyncReport> {
    let removed = tx.delete_links_by_source(note_id).await?;
    debug!(removed, "Removed previous outgoing links");

    let mut report = SyncReport {
        note_id,
        extracted: parsed.len(),
        ..Default::default()
    };

    for link in parsed {
        let target = resolve_or_create_target(tx, &link.target_title).await?;
        if target.created {
            report.phantom_notes.push(target.note.id);
        }

        let req = CreateLinkRequest {
            source_note_id: note_id,
            target_note_id: target.note.id,
            link_text: link.link_text().to_string(),
            context: Some(link.context.clone()),
        };

        match tx.create_link(req).await {
            Ok(created) => {
                trace!(link_id = %created.id, target_title = %link.target_title, "Created link");
                report.created += 1;
            }
            Err(e) if e.is_unique_violation() => {
                debug!(
                    target_title = %link.target_title,
                    link_text = link.link_text(),
                    "Skipped duplicate link"
                );
                report.skipped_duplicates += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, StoreOp};

    async fn note(store: &NoteStore, title: &str, content: &str) -> Note {
        store
            .notes
            .insert(CreateNoteRequest {
                title: title.to_string(),
                content: content.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sync_creates_phantom_target() {
        let memory = InMemoryStore::new();
        let store = memory.note_store();
        let source = note(&store, "Source", "[[Ghost]]").await;
        let sync = LinkSynchronizer::new(store.clone());

        let report = sync.sync(source.id, "[[Ghost]]").await.unwrap();

        assert_eq!(report.extracted, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.phantom_notes.len(), 1);

        let ghost = store.notes.find_by_title("Ghost").await.unwrap().unwrap();
        assert_eq!(ghost.content, "");
        assert!(!ghost.is_pinned && !ghost.is_favorite && !ghost.is_archived);
        assert_eq!(report.phantom_notes[0], ghost.id);

        let links = store.links.list_by_source(source.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_note_id, ghost.id);
        assert_eq!(links[0].link_text, "Ghost");
        assert_eq!(links[0].context.as_deref(), Some("[[Ghost]]"));
        assert_eq!(memory.notes().await.len(), 2);
    }

    #[tokio::test]
    async fn sync_links_existing_note_by_exact_title() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let target = note(&store, "Target", "body").await;
        let sync = LinkSynchronizer::new(store.clone());

        let report = sync.sync(source.id, "see [[Target|the target]]").await.unwrap();
        assert!(report.phantom_notes.is_empty());

        let links = store.links.list_by_source(source.id).await.unwrap();
        assert_eq!(links[0].target_note_id, target.id);
        assert_eq!(links[0].link_text, "the target");
    }

    #[tokio::test]
    async fn title_match_is_case_sensitive() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let existing = note(&store, "Target", "body").await;
        let sync = LinkSynchronizer::new(store.clone());

        let report = sync.sync(source.id, "[[target]]").await.unwrap();
        assert_eq!(report.phantom_notes.len(), 1);
        assert_ne!(report.phantom_notes[0], existing.id);
    }

    #[tokio::test]
    async fn duplicate_triples_are_skipped() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());

        let report = sync.sync(source.id, "[[X]] and again [[X]]").await.unwrap();

        assert_eq!(report.extracted, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.phantom_notes.len(), 1);
        assert_eq!(store.links.list_by_source(source.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_target_with_different_text_is_two_links() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());

        let report = sync.sync(source.id, "[[X]] [[X|ex]]").await.unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.phantom_notes.len(), 1);
    }

    #[tokio::test]
    async fn resync_replaces_link_set() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());

        sync.sync(source.id, "[[A]] [[B]]").await.unwrap();
        sync.sync(source.id, "[[B]] [[C]]").await.unwrap();

        let links = store.links.list_by_source(source.id).await.unwrap();
        let texts: Vec<&str> = links.iter().map(|l| l.link_text.as_str()).collect();
        assert_eq!(texts, vec!["B", "C"]);

        // Phantom A survives; only links are torn down.
        assert!(store.notes.find_by_title("A").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sync_is_idempotent() {
        let memory = InMemoryStore::new();
        let store = memory.note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());
        let content = "[[A]] then [[B|bee]]";

        let first = sync.sync(source.id, content).await.unwrap();
        let second = sync.sync(source.id, content).await.unwrap();

        assert_eq!(first.created, second.created);
        assert!(second.phantom_notes.is_empty());
        assert_eq!(memory.notes().await.len(), 3);

        let links = store.links.list_by_source(source.id).await.unwrap();
        let texts: Vec<&str> = links.iter().map(|l| l.link_text.as_str()).collect();
        assert_eq!(texts, vec!["A", "bee"]);
    }

    #[tokio::test]
    async fn empty_content_clears_links() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());

        sync.sync(source.id, "[[A]]").await.unwrap();
        let report = sync.sync(source.id, "").await.unwrap();

        assert_eq!(report.extracted, 0);
        assert!(store.links.list_by_source(source.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_note_is_not_found() {
        let store = InMemoryStore::new().note_store();
        let sync = LinkSynchronizer::new(store);

        let err = sync.sync(Uuid::now_v7(), "[[A]]").await.unwrap_err();
        assert!(matches!(err, Error::NoteNotFound(_)));
    }

    #[tokio::test]
    async fn failure_mid_sync_rolls_back() {
        let memory = InMemoryStore::new();
        let store = memory.note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());
        sync.sync(source.id, "[[Old]]").await.unwrap();

        memory.inject_failure(StoreOp::CreateLink, 1);
        let err = sync.sync(source.id, "[[New]] [[Newer]]").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));

        let links = store.links.list_by_source(source.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_text, "Old");
        assert!(store.notes.find_by_title("New").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn phantom_creation_failure_propagates() {
        let memory = InMemoryStore::new();
        let store = memory.note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());

        memory.inject_failure(StoreOp::InsertNote, 0);
        let err = sync.sync(source.id, "[[Missing]]").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert!(store.links.list_by_source(source.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_syncs_of_one_note_serialize() {
        let store = InMemoryStore::new().note_store();
        let source = note(&store, "Source", "").await;
        let sync = LinkSynchronizer::new(store.clone());

        let a = sync.sync(source.id, "[[A]] [[B]]");
        let b = sync.sync(source.id, "[[C]]");
        let (ra, rb) = tokio::join!(a, b);
        ra.unwrap();
        rb.unwrap();

        let links = store.links.list_by_source(source.id).await.unwrap();
        let texts: Vec<&str> = links.iter().map(|l| l.link_text.as_str()).collect();
        assert!(texts == vec!["A", "B"] || texts == vec!["C"]);
    }

    #[tokio::test]
    async fn resolve_or_create_target_reuses_existing() {
        let memory = InMemoryStore::new();
        let store = memory.note_store();
        let existing = note(&store, "Known", "body").await;

        let mut tx = store.sync.begin_sync().await.unwrap();
        let known = resolve_or_create_target(tx.as_mut(), "Known").await.unwrap();
        let fresh = resolve_or_create_target(tx.as_mut(), "Fresh").await.unwrap();
        let again = resolve_or_create_target(tx.as_mut(), "Fresh").await.unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        assert_eq!(known.note.id, existing.id);
        assert!(!known.created);
        assert!(fresh.created);
        assert!(fresh.note.is_phantom());
        assert!(!again.created);
        assert_eq!(again.note.id, fresh.note.id);
    }
}
