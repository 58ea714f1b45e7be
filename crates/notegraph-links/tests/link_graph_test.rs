//! End-to-end behavior of the link graph through `LinkService` over the
//! in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notegraph_links::{
    BacklinksOptions, CreateNoteRequest, Error, InMemoryStore, LinkService, ListNotesRequest,
    Note, NoteRepository, OutgoingLinksOptions, RelatedNotesOptions, Result, StoreOp,
    UpdateNoteRequest,
};
use uuid::Uuid;

async fn create(service: &LinkService, title: &str, content: &str) -> Note {
    service
        .create_note(CreateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        })
        .await
        .expect("create note")
        .note
}

fn triples(memory_links: &[notegraph_links::NoteLink], source: Uuid) -> HashSet<(Uuid, String)> {
    memory_links
        .iter()
        .filter(|l| l.source_note_id == source)
        .map(|l| (l.target_note_id, l.link_text.clone()))
        .collect()
}

#[tokio::test]
async fn test_outgoing_links_match_content_after_every_save() {
    let memory = InMemoryStore::new();
    let service = LinkService::new(memory.note_store());
    let note = create(&service, "Index", "[[A]] [[B|bee]]").await;

    let first = triples(&memory.links().await, note.id);
    assert_eq!(first.len(), 2);

    service
        .update_note(
            note.id,
            UpdateNoteRequest {
                content: Some("[[B|bee]] [[C]]".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let second = triples(&memory.links().await, note.id);
    let texts: HashSet<String> = second.iter().map(|(_, t)| t.clone()).collect();
    assert_eq!(texts, ["bee", "C"].iter().map(|s| s.to_string()).collect());
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let memory = InMemoryStore::new();
    let service = LinkService::new(memory.note_store());
    let note = create(&service, "Index", "").await;
    let content = "[[One]] [[Two]] [[One]]";

    let first = service.sync(note.id, content).await.unwrap();
    let notes_after_first = memory.notes().await.len();
    let links_after_first = triples(&memory.links().await, note.id);

    let second = service.sync(note.id, content).await.unwrap();
    assert_eq!(memory.notes().await.len(), notes_after_first);
    assert_eq!(triples(&memory.links().await, note.id), links_after_first);

    assert_eq!(first.phantom_notes.len(), 2);
    assert!(second.phantom_notes.is_empty());
    assert_eq!(second.skipped_duplicates, 1);
}

#[tokio::test]
async fn test_phantom_is_filled_by_later_note_with_same_title() {
    let service = LinkService::new(InMemoryStore::new().note_store());
    let index = create(&service, "Index", "[[Later]]").await;

    let broken = service.broken_links(index.id).await.unwrap();
    assert_eq!(broken.len(), 1);
    let phantom_id = broken[0].target_note_id;

    service
        .update_note(
            phantom_id,
            UpdateNoteRequest {
                content: Some("now written".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(service.broken_links(index.id).await.unwrap().is_empty());
    assert!(service.red_link_notes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_sync_keeps_previous_links() {
    let memory = InMemoryStore::new();
    let service = LinkService::new(memory.note_store());
    let note = create(&service, "Index", "[[Kept]]").await;
    let before = memory.links().await;
    let notes_before = memory.notes().await.len();

    memory.inject_failure(StoreOp::CreateLink, 1);
    let err = service
        .sync(note.id, "[[New one]] [[New two]]")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert_eq!(memory.links().await, before);
    assert_eq!(memory.notes().await.len(), notes_before);
}

#[tokio::test]
async fn test_deleting_note_removes_links_both_ways() {
    let memory = InMemoryStore::new();
    let service = LinkService::new(memory.note_store());
    let hub = create(&service, "Hub", "[[Leaf]]").await;
    let spoke = create(&service, "Spoke", "[[Hub]]").await;

    service.delete_note(hub.id).await.unwrap();

    assert!(memory
        .links()
        .await
        .iter()
        .all(|l| l.source_note_id != hub.id && l.target_note_id != hub.id));
    let outgoing = service
        .outgoing(spoke.id, OutgoingLinksOptions::default())
        .await
        .unwrap();
    assert!(outgoing.is_empty());
    let err = service
        .backlinks(hub.id, BacklinksOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(_)));
}

#[tokio::test]
async fn test_related_notes_combine_signals() {
    let memory = InMemoryStore::new();
    let service = LinkService::new(memory.note_store());
    let store = service.store().clone();

    let folder = store.folders.create("Research").await.unwrap();
    let tag = store.tags.create("graphs").await.unwrap();

    let subject = service
        .create_note(CreateNoteRequest {
            title: "Graph theory".to_string(),
            content: "Vertices and edges".to_string(),
            folder_id: Some(folder.id),
            ..Default::default()
        })
        .await
        .unwrap()
        .note;
    let euler = create(&service, "Euler", "Bridges of Königsberg, back to [[Graph theory]]").await;
    service
        .update_note(
            subject.id,
            UpdateNoteRequest {
                content: Some("Vertices and edges, see [[Euler]]".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let sibling = service
        .create_note(CreateNoteRequest {
            title: "Trees".to_string(),
            content: "Acyclic graph with vertices".to_string(),
            folder_id: Some(folder.id),
            ..Default::default()
        })
        .await
        .unwrap()
        .note;
    let unrelated = create(&service, "Groceries", "milk bread").await;
    let archived = service
        .create_note(CreateNoteRequest {
            title: "Old graph notes".to_string(),
            content: "graph vertices edges".to_string(),
            is_archived: true,
            ..Default::default()
        })
        .await
        .unwrap()
        .note;

    store.tags.add_to_note(subject.id, tag.id).await.unwrap();
    store.tags.add_to_note(sibling.id, tag.id).await.unwrap();

    let related = service
        .related(subject.id, RelatedNotesOptions::default())
        .await
        .unwrap();
    let ids: Vec<Uuid> = related.iter().map(|r| r.note.id).collect();

    assert!(ids.contains(&euler.id));
    assert!(ids.contains(&sibling.id));
    assert!(!ids.contains(&unrelated.id));
    assert!(!ids.contains(&archived.id));
    assert!(!ids.contains(&subject.id));

    let euler_hit = related.iter().find(|r| r.note.id == euler.id).unwrap();
    assert_eq!(
        euler_hit.reasons.link_relation,
        Some(notegraph_links::LinkRelation::Bidirectional)
    );
    let sibling_hit = related.iter().find(|r| r.note.id == sibling.id).unwrap();
    assert!(sibling_hit.reasons.same_folder);
    assert_eq!(sibling_hit.reasons.common_tags, 1);

    for pair in related.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let unlinked = service
        .related(
            subject.id,
            RelatedNotesOptions {
                exclude_linked: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(unlinked.iter().all(|r| r.note.id != euler.id));
}

#[tokio::test]
async fn test_concurrent_saves_of_one_note_leave_one_consistent_link_set() {
    let memory = InMemoryStore::new();
    let service = LinkService::new(memory.note_store());
    let note = create(&service, "Index", "").await;

    let contents = ["[[A]] [[B]]", "[[C]]", "[[D]] [[E]] [[F]]"];
    let handles: Vec<_> = contents
        .iter()
        .map(|content| {
            let service = service.clone();
            let content = content.to_string();
            tokio::spawn(async move { service.sync(note.id, &content).await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let texts: HashSet<String> = memory
        .links()
        .await
        .iter()
        .filter(|l| l.source_note_id == note.id)
        .map(|l| l.link_text.clone())
        .collect();
    let expected: Vec<HashSet<String>> = contents
        .iter()
        .map(|c| {
            notegraph_links::extract_links(c)
                .iter()
                .map(|l| l.link_text().to_string())
                .collect()
        })
        .collect();
    assert!(expected.contains(&texts), "links {texts:?} match no single save");
}

/// Note repository that stalls after writing one specific content.
struct StallingNotes {
    inner: Arc<dyn NoteRepository>,
    stall_on: &'static str,
    stall: Duration,
}

#[async_trait]
impl NoteRepository for StallingNotes {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        self.inner.insert(req).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        self.inner.fetch(id).await
    }

    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<Note>> {
        self.inner.fetch_many(ids).await
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
        self.inner.find_by_title(title).await
    }

    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>> {
        self.inner.list(req).await
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let stall = req.content.as_deref() == Some(self.stall_on);
        let note = self.inner.update(id, req).await?;
        if stall {
            tokio::time::sleep(self.stall).await;
        }
        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        self.inner.exists(id).await
    }
}

#[tokio::test]
async fn test_overlapping_content_updates_keep_links_matching_stored_content() {
    let memory = InMemoryStore::new();
    let mut store = memory.note_store();
    store.notes = Arc::new(StallingNotes {
        inner: store.notes.clone(),
        stall_on: "[[A]]",
        stall: Duration::from_millis(100),
    });
    let service = LinkService::new(store);
    let note_id = create(&service, "Index", "").await.id;

    let update = |content: &'static str| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .update_note(
                    note_id,
                    UpdateNoteRequest {
                        content: Some(content.to_string()),
                        ..Default::default()
                    },
                )
                .await
        })
    };

    let slow = update("[[A]]");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = update("[[B]]");
    slow.await.unwrap().unwrap();
    fast.await.unwrap().unwrap();

    let stored = service.get_note(note_id).await.unwrap();
    let expected: HashSet<String> = notegraph_links::extract_links(&stored.content)
        .iter()
        .map(|l| l.link_text().to_string())
        .collect();
    let actual: HashSet<String> = memory
        .links()
        .await
        .iter()
        .filter(|l| l.source_note_id == note_id)
        .map(|l| l.link_text.clone())
        .collect();
    assert_eq!(stored.content, "[[B]]");
    assert_eq!(actual, expected);
}
