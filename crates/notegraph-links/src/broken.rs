//! Broken-link detection.
//!
//! A link is broken when its target note has empty content. That covers
//! phantom notes created by link sync and notes whose content was later
//! cleared; the two cannot be told apart.

use std::collections::HashMap;

use tracing::{debug, instrument};
use uuid::Uuid;

use notegraph_core::{BrokenLink, ListNotesRequest, Note, NoteStore, RedLinkNote, Result};

/// Read-only queries for links pointing at empty notes.
#[derive(Clone)]
pub struct BrokenLinkDetector {
    store: NoteStore,
}

impl BrokenLinkDetector {
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }

    /// Outgoing links of `note_id` whose target has empty content, in link
    /// creation order. Fails with `NoteNotFound` when the note does not exist.
    #[instrument(skip(self), fields(
        subsystem = "links",
        component = "broken_links",
        op = "find_broken_links",
        note_id = %note_id,
    ))]
    pub async fn find_broken_links(&self, note_id: Uuid) -> Result<Vec<BrokenLink>> {
        // Surfaces NoteNotFound
        self.store.notes.fetch(note_id).await?;

        let links = self.store.links.list_by_source(note_id).await?;
        let target_ids: Vec<Uuid> = links.iter().map(|l| l.target_note_id).collect();
        let targets: HashMap<Uuid, Note> = self
            .store
            .notes
            .fetch_many(&target_ids)
            .await?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();

        let broken: Vec<BrokenLink> = links
            .iter()
            .filter_map(|link| {
                let target = targets.get(&link.target_note_id)?;
                target.is_phantom().then(|| BrokenLink {
                    link_id: link.id,
                    target_note_id: target.id,
                    target_title: target.title.clone(),
                })
            })
            .collect();

        debug!(
            link_count = links.len(),
            result_count = broken.len(),
            "Broken links detected"
        );
        Ok(broken)
    }

    /// Every note with empty content and how many links point at it,
    /// oldest first.
    #[instrument(skip(self), fields(
        subsystem = "links",
        component = "broken_links",
        op = "find_red_link_notes",
    ))]
    pub async fn find_red_link_notes(&self) -> Result<Vec<RedLinkNote>> {
        let phantoms = self
            .store
            .notes
            .list(ListNotesRequest {
                phantom_only: true,
                ..Default::default()
            })
            .await?;

        let ids: Vec<Uuid> = phantoms.iter().map(|n| n.id).collect();
        let counts = self.store.links.count_by_targets(&ids).await?;

        let red_links: Vec<RedLinkNote> = phantoms
            .into_iter()
            .map(|n| RedLinkNote {
                incoming_links_count: counts.get(&n.id).copied().unwrap_or(0),
                id: n.id,
                title: n.title,
            })
            .collect();

        debug!(result_count = red_links.len(), "Red-link notes found");
        Ok(red_links)
    }
}
