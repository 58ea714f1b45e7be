//! Related-note scoring.
//!
//! Every non-archived note other than the subject is a candidate. A
//! candidate's score is a linear sum:
//!
//! | Signal | Weight |
//! |--------|--------|
//! | shared tag | 3.0 each |
//! | links in both directions | 5.0 |
//! | link in one direction | 2.5 |
//! | same folder | 1.0 |
//! | shared keyword | 0.5 each |
//!
//! Results at or above the threshold are ranked by score, highest first,
//! ties broken by note id (creation order).

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, instrument, trace};
use uuid::Uuid;

use notegraph_core::defaults::{WEIGHT_COMMON_KEYWORD, WEIGHT_COMMON_TAG, WEIGHT_SAME_FOLDER};
use notegraph_core::{
    extract_keywords, LinkRelation, ListNotesRequest, Note, NoteStore, RelatedNote,
    RelatedNotesOptions, RelationReasons, Result,
};

/// The subject note and everything scoring compares against.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub folder_id: Option<Uuid>,
    pub tags: HashSet<Uuid>,
    pub outgoing: HashSet<Uuid>,
    pub incoming: HashSet<Uuid>,
    pub keywords: HashSet<String>,
}

/// Keywords of a note's title and content together.
pub fn note_keywords(note: &Note) -> HashSet<String> {
    extract_keywords(&format!("{} {}", note.title, note.content))
        .into_iter()
        .collect()
}

/// Score one candidate against the subject.
///
/// Returns `None` when `exclude_linked` is set and the candidate is linked
/// in either direction; such a candidate is dropped, not scored zero.
pub fn score_candidate(
    ctx: &ScoringContext,
    candidate: &Note,
    candidate_tags: &[Uuid],
    exclude_linked: bool,
) -> Option<(f64, RelationReasons)> {
    let mut score = 0.0;
    let mut reasons = RelationReasons::default();

    reasons.common_tags = candidate_tags
        .iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|tag| ctx.tags.contains(tag))
        .count();
    score += reasons.common_tags as f64 * WEIGHT_COMMON_TAG;

    reasons.link_relation = LinkRelation::classify(
        ctx.outgoing.contains(&candidate.id),
        ctx.incoming.contains(&candidate.id),
    );
    if let Some(relation) = reasons.link_relation {
        if exclude_linked {
            return None;
        }
        score += relation.weight();
    }

    if candidate.folder_id.is_some() && candidate.folder_id == ctx.folder_id {
        reasons.same_folder = true;
        score += WEIGHT_SAME_FOLDER;
    }

    let candidate_keywords = note_keywords(candidate);
    reasons.keyword_similarity = ctx.keywords.intersection(&candidate_keywords).count();
    score += reasons.keyword_similarity as f64 * WEIGHT_COMMON_KEYWORD;

    Some((score, reasons))
}

/// Highest score first; equal scores by ascending note id.
fn rank(a: &RelatedNote, b: &RelatedNote) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.note.id.cmp(&b.note.id))
}

/// Ranks notes by relatedness to a subject note.
#[derive(Clone)]
pub struct RelatedNotesScorer {
    store: NoteStore,
}

impl RelatedNotesScorer {
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }

    /// Fails with `NoteNotFound` when `note_id` does not exist.
    #[instrument(skip(self), fields(
        subsystem = "links",
        component = "related",
        op = "get_related",
        note_id = %note_id,
    ))]
    pub async fn get_related(
        &self,
        note_id: Uuid,
        options: RelatedNotesOptions,
    ) -> Result<Vec<RelatedNote>> {
        let start = Instant::now();
        let note = self.store.notes.fetch(note_id).await?;

        let outgoing = self
            .store
            .links
            .list_by_source(note_id)
            .await?
            .into_iter()
            .map(|l| l.target_note_id)
            .collect();
        let incoming = self
            .store
            .links
            .list_by_target(note_id)
            .await?
            .into_iter()
            .map(|l| l.source_note_id)
            .collect();

        let candidates = self
            .store
            .notes
            .list(ListNotesRequest {
                exclude_id: Some(note_id),
                exclude_archived: true,
                phantom_only: false,
            })
            .await?;

        let mut ids: Vec<Uuid> = Vec::with_capacity(candidates.len() + 1);
        ids.push(note_id);
        ids.extend(candidates.iter().map(|c| c.id));
        let mut tags = self.store.tags.get_for_notes(&ids).await?;

        let ctx = ScoringContext {
            folder_id: note.folder_id,
            tags: tags.remove(&note_id).unwrap_or_default().into_iter().collect(),
            outgoing,
            incoming,
            keywords: note_keywords(&note),
        };

        let mut related = Vec::new();
        for candidate in &candidates {
            let candidate_tags = tags.get(&candidate.id).map(Vec::as_slice).unwrap_or(&[]);
            let Some((score, reasons)) =
                score_candidate(&ctx, candidate, candidate_tags, options.exclude_linked)
            else {
                trace!(candidate_id = %candidate.id, "Excluded linked candidate");
                continue;
            };

            trace!(candidate_id = %candidate.id, score, "Scored candidate");
            if score >= options.threshold {
                related.push(RelatedNote {
                    note: candidate.summary(),
                    score,
                    reasons,
                });
            }
        }

        related.sort_by(rank);
        related.truncate(options.limit);

        debug!(
            candidate_count = candidates.len(),
            result_count = related.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Related notes scored"
        );
        Ok(related)
    }
}
