//! In-memory store for tests and embedded use.
//!
//! Implements every repository trait over a single mutex-guarded state.
//! Sync transactions take the state lock for their whole lifetime and work
//! on a copy, which is written back on commit and discarded on drop.
//!
//! ## Usage
//!
//! ```rust
//! use notegraph_links::memory::{InMemoryStore, StoreOp};
//!
//! let store = InMemoryStore::new().fail_on(StoreOp::CreateLink, 1);
//! let handles = store.note_store();
//! # let _ = handles;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use notegraph_core::{
    new_v7, CreateLinkRequest, CreateNoteRequest, Error, Folder, FolderRepository, LinkRepository,
    LinkSyncStore, LinkSyncTransaction, LinkedNote, ListNotesRequest, Note, NoteLink,
    NoteRepository, NoteStore, Result, Tag, TagRepository, UpdateLinkRequest, UpdateNoteRequest,
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FetchNote,
    FindNoteByTitle,
    InsertNote,
    UpdateNote,
    ListNotes,
    CreateLink,
    DeleteLinks,
    ListLinks,
    GetTags,
    Commit,
}

#[derive(Debug, Default, Clone)]
struct State {
    /// Insertion order is creation order.
    notes: Vec<Note>,
    links: Vec<NoteLink>,
    tags: Vec<Tag>,
    note_tags: Vec<(Uuid, Uuid)>,
    folders: Vec<Folder>,
}

impl State {
    fn note(&self, id: Uuid) -> Result<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or(Error::NoteNotFound(id))
    }

    fn find_by_title(&self, title: &str) -> Option<Note> {
        self.notes.iter().find(|n| n.title == title).cloned()
    }

    fn insert_note(&mut self, req: CreateNoteRequest) -> Result<Note> {
        if let Some(folder_id) = req.folder_id {
            self.check_folder(folder_id)?;
        }
        let now = Utc::now();
        let note = Note {
            id: new_v7(),
            title: req.title,
            content: req.content,
            is_pinned: req.is_pinned,
            is_favorite: req.is_favorite,
            is_archived: req.is_archived,
            folder_id: req.folder_id,
            created_at_utc: now,
            updated_at_utc: now,
        };
        self.notes.push(note.clone());
        Ok(note)
    }

    fn check_folder(&self, folder_id: Uuid) -> Result<()> {
        if self.folders.iter().any(|f| f.id == folder_id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Folder {}", folder_id)))
        }
    }

    fn is_duplicate(&self, source: Uuid, target: Uuid, link_text: &str, except: Option<Uuid>) -> bool {
        self.links.iter().any(|l| {
            Some(l.id) != except
                && l.source_note_id == source
                && l.target_note_id == target
                && l.link_text == link_text
        })
    }

    fn create_link(&mut self, req: CreateLinkRequest) -> Result<NoteLink> {
        self.note(req.source_note_id)?;
        self.note(req.target_note_id)?;
        if self.is_duplicate(req.source_note_id, req.target_note_id, &req.link_text, None) {
            return Err(Error::UniqueConstraint(format!(
                "{} -> {} ({})",
                req.source_note_id, req.target_note_id, req.link_text
            )));
        }
        let link = NoteLink {
            id: new_v7(),
            source_note_id: req.source_note_id,
            target_note_id: req.target_note_id,
            link_text: req.link_text,
            context: req.context,
            created_at_utc: Utc::now(),
        };
        self.links.push(link.clone());
        Ok(link)
    }

    fn delete_links_by_source(&mut self, note_id: Uuid) -> u64 {
        let before = self.links.len();
        self.links.retain(|l| l.source_note_id != note_id);
        (before - self.links.len()) as u64
    }

    fn linked(&self, link: &NoteLink, other: Uuid) -> Option<LinkedNote> {
        self.notes
            .iter()
            .find(|n| n.id == other)
            .map(|n| LinkedNote {
                link: link.clone(),
                note: n.summary(),
            })
    }
}

#[derive(Debug, Default)]
struct FailurePlan {
    /// Remaining successful calls before the operation fails once.
    countdown: HashMap<StoreOp, usize>,
}

/// Mutex-guarded, non-persistent [`NoteStore`] backend.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<AsyncMutex<State>>,
    failures: Arc<Mutex<FailurePlan>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `op` succeed `after` more times, then fail once with
    /// `StoreUnavailable`.
    pub fn fail_on(self, op: StoreOp, after: usize) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .countdown
            .insert(op, after);
        self
    }

    /// Same as [`fail_on`](Self::fail_on) for an already shared store.
    pub fn inject_failure(&self, op: StoreOp, after: usize) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .countdown
            .insert(op, after);
    }

    /// Handles to every repository, all backed by this store.
    pub fn note_store(&self) -> NoteStore {
        let this = Arc::new(self.clone());
        NoteStore {
            notes: this.clone(),
            links: this.clone(),
            tags: this.clone(),
            folders: this.clone(),
            sync: this,
        }
    }

    /// Snapshot of every note, oldest first.
    pub async fn notes(&self) -> Vec<Note> {
        self.state.lock().await.notes.clone()
    }

    /// Snapshot of every link, oldest first.
    pub async fn links(&self) -> Vec<NoteLink> {
        self.state.lock().await.links.clone()
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        check_failure(&self.failures, op)
    }
}

fn check_failure(failures: &Mutex<FailurePlan>, op: StoreOp) -> Result<()> {
    let mut plan = failures.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(remaining) = plan.countdown.get_mut(&op) else {
        return Ok(());
    };
    if *remaining > 0 {
        *remaining -= 1;
        return Ok(());
    }
    plan.countdown.remove(&op);
    Err(Error::StoreUnavailable(format!("injected failure: {:?}", op)))
}

#[async_trait]
impl NoteRepository for InMemoryStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        self.check(StoreOp::InsertNote)?;
        self.state.lock().await.insert_note(req)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        self.check(StoreOp::FetchNote)?;
        self.state.lock().await.note(id).cloned()
    }

    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<Note>> {
        self.check(StoreOp::FetchNote)?;
        let state = self.state.lock().await;
        Ok(state
            .notes
            .iter()
            .filter(|n| ids.contains(&n.id))
            .cloned()
            .collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
        self.check(StoreOp::FindNoteByTitle)?;
        Ok(self.state.lock().await.find_by_title(title))
    }

    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>> {
        self.check(StoreOp::ListNotes)?;
        let state = self.state.lock().await;
        Ok(state
            .notes
            .iter()
            .filter(|n| Some(n.id) != req.exclude_id)
            .filter(|n| !(req.exclude_archived && n.is_archived))
            .filter(|n| !req.phantom_only || n.is_phantom())
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        self.check(StoreOp::UpdateNote)?;
        let mut state = self.state.lock().await;
        if let Some(Some(folder_id)) = req.folder_id {
            state.check_folder(folder_id)?;
        }
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::NoteNotFound(id))?;

        if let Some(title) = req.title {
            note.title = title;
        }
        if let Some(content) = req.content {
            note.content = content;
        }
        if let Some(is_pinned) = req.is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(is_favorite) = req.is_favorite {
            note.is_favorite = is_favorite;
        }
        if let Some(is_archived) = req.is_archived {
            note.is_archived = is_archived;
        }
        if let Some(folder_id) = req.folder_id {
            note.folder_id = folder_id;
        }
        note.updated_at_utc = Utc::now();
        Ok(note.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.note(id)?;
        state.notes.retain(|n| n.id != id);
        state
            .links
            .retain(|l| l.source_note_id != id && l.target_note_id != id);
        state.note_tags.retain(|(note_id, _)| *note_id != id);
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        self.check(StoreOp::FetchNote)?;
        Ok(self.state.lock().await.note(id).is_ok())
    }
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn create(&self, req: CreateLinkRequest) -> Result<NoteLink> {
        self.check(StoreOp::CreateLink)?;
        self.state.lock().await.create_link(req)
    }

    async fn get(&self, id: Uuid) -> Result<NoteLink> {
        let state = self.state.lock().await;
        state
            .links
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(Error::LinkNotFound(id))
    }

    async fn update(&self, id: Uuid, req: UpdateLinkRequest) -> Result<NoteLink> {
        let mut state = self.state.lock().await;
        let current = state
            .links
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(Error::LinkNotFound(id))?;

        let link_text = req.link_text.unwrap_or(current.link_text);
        if state.is_duplicate(
            current.source_note_id,
            current.target_note_id,
            &link_text,
            Some(id),
        ) {
            return Err(Error::UniqueConstraint(format!("link {} ({})", id, link_text)));
        }

        let link = state
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(Error::LinkNotFound(id))?;
        link.link_text = link_text;
        if let Some(context) = req.context {
            link.context = Some(context);
        }
        Ok(link.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        let before = state.links.len();
        state.links.retain(|l| l.id != id);
        if state.links.len() == before {
            return Err(Error::LinkNotFound(id));
        }
        Ok(())
    }

    async fn list_by_source(&self, note_id: Uuid) -> Result<Vec<NoteLink>> {
        self.check(StoreOp::ListLinks)?;
        let state = self.state.lock().await;
        Ok(state
            .links
            .iter()
            .filter(|l| l.source_note_id == note_id)
            .cloned()
            .collect())
    }

    async fn list_by_target(&self, note_id: Uuid) -> Result<Vec<NoteLink>> {
        self.check(StoreOp::ListLinks)?;
        let state = self.state.lock().await;
        Ok(state
            .links
            .iter()
            .filter(|l| l.target_note_id == note_id)
            .cloned()
            .collect())
    }

    async fn count_by_targets(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        self.check(StoreOp::ListLinks)?;
        let state = self.state.lock().await;
        let mut counts: HashMap<Uuid, i64> = note_ids.iter().map(|id| (*id, 0)).collect();
        for link in &state.links {
            if let Some(count) = counts.get_mut(&link.target_note_id) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    async fn get_outgoing(&self, note_id: Uuid, limit: i64) -> Result<Vec<LinkedNote>> {
        self.check(StoreOp::ListLinks)?;
        let state = self.state.lock().await;
        Ok(state
            .links
            .iter()
            .rev()
            .filter(|l| l.source_note_id == note_id)
            .filter_map(|l| state.linked(l, l.target_note_id))
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_backlinks(
        &self,
        note_id: Uuid,
        limit: i64,
        exclude_archived: bool,
    ) -> Result<Vec<LinkedNote>> {
        self.check(StoreOp::ListLinks)?;
        let state = self.state.lock().await;
        Ok(state
            .links
            .iter()
            .rev()
            .filter(|l| l.target_note_id == note_id)
            .filter_map(|l| state.linked(l, l.source_note_id))
            .filter(|linked| !(exclude_archived && linked.note.is_archived))
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn create(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Tag name cannot be empty".to_string()));
        }
        let mut state = self.state.lock().await;
        if let Some(tag) = state.tags.iter().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: new_v7(),
            name: name.to_string(),
            created_at_utc: Utc::now(),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let mut tags = self.state.lock().await.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn add_to_note(&self, note_id: Uuid, tag_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.note(note_id)?;
        if !state.tags.iter().any(|t| t.id == tag_id) {
            return Err(Error::NotFound(format!("Tag {}", tag_id)));
        }
        if !state.note_tags.contains(&(note_id, tag_id)) {
            state.note_tags.push((note_id, tag_id));
        }
        Ok(())
    }

    async fn remove_from_note(&self, note_id: Uuid, tag_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.note_tags.retain(|pair| *pair != (note_id, tag_id));
        Ok(())
    }

    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Uuid>> {
        self.check(StoreOp::GetTags)?;
        let state = self.state.lock().await;
        Ok(state
            .note_tags
            .iter()
            .filter(|(n, _)| *n == note_id)
            .map(|(_, t)| *t)
            .collect())
    }

    async fn get_for_notes(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        self.check(StoreOp::GetTags)?;
        let state = self.state.lock().await;
        let mut tags: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (note_id, tag_id) in &state.note_tags {
            if note_ids.contains(note_id) {
                tags.entry(*note_id).or_default().push(*tag_id);
            }
        }
        Ok(tags)
    }
}

#[async_trait]
impl FolderRepository for InMemoryStore {
    async fn create(&self, name: &str) -> Result<Folder> {
        let folder = Folder {
            id: new_v7(),
            name: name.to_string(),
            created_at_utc: Utc::now(),
        };
        self.state.lock().await.folders.push(folder.clone());
        Ok(folder)
    }

    async fn list(&self) -> Result<Vec<Folder>> {
        let mut folders = self.state.lock().await.folders.clone();
        folders.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(folders)
    }
}

#[async_trait]
impl LinkSyncStore for InMemoryStore {
    async fn begin_sync(&self) -> Result<Box<dyn LinkSyncTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard: Some(guard),
            working,
            failures: self.failures.clone(),
        }))
    }
}

/// Sync transaction over a private copy of the state.
struct InMemoryTransaction {
    guard: Option<OwnedMutexGuard<State>>,
    working: State,
    failures: Arc<Mutex<FailurePlan>>,
}

impl InMemoryTransaction {
    fn check(&self, op: StoreOp) -> Result<()> {
        if self.guard.is_none() {
            return Err(Error::Internal(
                "sync transaction already committed".to_string(),
            ));
        }
        check_failure(&self.failures, op)
    }
}

#[async_trait]
impl LinkSyncTransaction for InMemoryTransaction {
    async fn find_note_by_title(&mut self, title: &str) -> Result<Option<Note>> {
        self.check(StoreOp::FindNoteByTitle)?;
        Ok(self.working.find_by_title(title))
    }

    async fn insert_note(&mut self, req: CreateNoteRequest) -> Result<Note> {
        self.check(StoreOp::InsertNote)?;
        self.working.insert_note(req)
    }

    async fn delete_links_by_source(&mut self, note_id: Uuid) -> Result<u64> {
        self.check(StoreOp::DeleteLinks)?;
        Ok(self.working.delete_links_by_source(note_id))
    }

    async fn create_link(&mut self, req: CreateLinkRequest) -> Result<NoteLink> {
        self.check(StoreOp::CreateLink)?;
        self.working.create_link(req)
    }

    async fn commit(&mut self) -> Result<()> {
        self.check(StoreOp::Commit)?;
        if let Some(mut guard) = self.guard.take() {
            *guard = std::mem::take(&mut self.working);
        }
        Ok(())
    }
}
