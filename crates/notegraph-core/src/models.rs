//! Core data models for notegraph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note as persisted in the store.
///
/// A note whose `content` is the empty string is a phantom note: a
/// placeholder created because something linked to its title before it
/// existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub folder_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl Note {
    /// True when the note has empty content.
    pub fn is_phantom(&self) -> bool {
        self.content.is_empty()
    }

    /// Lightweight view used in link listings and related-note results.
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id,
            title: self.title.clone(),
            is_pinned: self.is_pinned,
            is_favorite: self.is_favorite,
            is_archived: self.is_archived,
            is_phantom: self.is_phantom(),
            updated_at_utc: self.updated_at_utc,
        }
    }
}

/// Note fields returned alongside links and related-note results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub is_pinned: bool,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub is_phantom: bool,
    pub updated_at_utc: DateTime<Utc>,
}

/// Request for creating a new note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

impl CreateNoteRequest {
    /// Request for a phantom note: the given title, empty content, all flags off.
    pub fn phantom(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Partial update of a note. Absent fields are left unchanged.
///
/// `folder_id` distinguishes "absent" (`None`) from "set to null"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_id: Option<Option<Uuid>>,
}

fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Filter for listing notes.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    /// Leave this note out of the result.
    pub exclude_id: Option<Uuid>,
    /// Leave archived notes out of the result.
    pub exclude_archived: bool,
    /// Only return notes with empty content.
    pub phantom_only: bool,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag that can be assigned to notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// FOLDER TYPES
// =============================================================================

/// A folder grouping notes. Notes sharing a folder score as related.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// LINK TYPES
// =============================================================================

/// A directed edge in the link graph.
///
/// `(source_note_id, target_note_id, link_text)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteLink {
    pub id: Uuid,
    pub source_note_id: Uuid,
    pub target_note_id: Uuid,
    pub link_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// A link together with the note on its other end.
///
/// For outgoing listings `note` is the target; for backlinks it is the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkedNote {
    pub link: NoteLink,
    pub note: NoteSummary,
}

/// Store-level request for persisting a link between two known notes.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLinkRequest {
    pub source_note_id: Uuid,
    pub target_note_id: Uuid,
    pub link_text: String,
    pub context: Option<String>,
}

/// Request for creating a single link by target title.
///
/// The target is resolved by exact title and created as a phantom note
/// when missing.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NewLinkRequest {
    pub source_id: Uuid,
    pub target_title: String,
    #[serde(default)]
    pub link_text: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Partial update of a link. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateLinkRequest {
    #[serde(default)]
    pub link_text: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Options for listing a note's outgoing links.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingLinksOptions {
    pub limit: i64,
    pub include_context: bool,
}

impl Default for OutgoingLinksOptions {
    fn default() -> Self {
        Self {
            limit: defaults::OUTGOING_LIMIT,
            include_context: false,
        }
    }
}

/// Options for listing a note's backlinks.
#[derive(Debug, Clone, Copy)]
pub struct BacklinksOptions {
    pub limit: i64,
    pub include_context: bool,
    pub exclude_archived: bool,
}

impl Default for BacklinksOptions {
    fn default() -> Self {
        Self {
            limit: defaults::BACKLINK_LIMIT,
            include_context: true,
            exclude_archived: true,
        }
    }
}

// =============================================================================
// EXTRACTION TYPES
// =============================================================================

/// A wiki-link found in note content.
///
/// `start_index` and `end_index` are character (not byte) offsets into the
/// scanned content; `end_index` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ParsedLink {
    /// The whole marker, e.g. `[[Target|Display]]`.
    pub full_text: String,
    /// Trimmed target note title.
    pub target_title: String,
    /// Trimmed display text override, if present and non-empty.
    pub display_text: Option<String>,
    /// Trimmed surrounding text.
    pub context: String,
    pub start_index: usize,
    pub end_index: usize,
}

impl ParsedLink {
    /// Text stored on the persisted link: display text if present, else the target title.
    pub fn link_text(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.target_title)
    }
}

/// Extracted links and keywords for a piece of content, without persistence.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkPreview {
    pub links: Vec<ParsedLink>,
    pub keywords: Vec<String>,
}

/// Outcome of a link synchronization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SyncReport {
    pub note_id: Uuid,
    /// Links found in the content.
    pub extracted: usize,
    /// Links persisted.
    pub created: usize,
    /// Links skipped because an identical triple was already persisted.
    pub skipped_duplicates: usize,
    /// Phantom notes created while resolving targets.
    pub phantom_notes: Vec<Uuid>,
}

// =============================================================================
// RELATED-NOTES TYPES
// =============================================================================

/// How a candidate is linked to the note being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LinkRelation {
    Bidirectional,
    Outgoing,
    Incoming,
}

impl LinkRelation {
    /// Classify from the two link directions. `None` when neither exists.
    pub fn classify(outgoing: bool, incoming: bool) -> Option<Self> {
        match (outgoing, incoming) {
            (true, true) => Some(LinkRelation::Bidirectional),
            (true, false) => Some(LinkRelation::Outgoing),
            (false, true) => Some(LinkRelation::Incoming),
            (false, false) => None,
        }
    }

    /// Score contribution of this relation.
    pub fn weight(self) -> f64 {
        match self {
            LinkRelation::Bidirectional => defaults::WEIGHT_BIDIRECTIONAL_LINK,
            LinkRelation::Outgoing | LinkRelation::Incoming => {
                defaults::WEIGHT_UNIDIRECTIONAL_LINK
            }
        }
    }
}

/// Breakdown of why a candidate scored as it did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RelationReasons {
    pub common_tags: usize,
    pub link_relation: Option<LinkRelation>,
    pub same_folder: bool,
    /// Number of shared keywords.
    pub keyword_similarity: usize,
}

/// A scored related-note candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RelatedNote {
    pub note: NoteSummary,
    pub score: f64,
    pub reasons: RelationReasons,
}

/// Options for related-note lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelatedNotesOptions {
    pub limit: usize,
    pub threshold: f64,
    /// Drop candidates linked in either direction.
    pub exclude_linked: bool,
}

impl Default for RelatedNotesOptions {
    fn default() -> Self {
        Self {
            limit: defaults::RELATED_LIMIT,
            threshold: defaults::RELATED_THRESHOLD,
            exclude_linked: false,
        }
    }
}

// =============================================================================
// BROKEN-LINK TYPES
// =============================================================================

/// An outgoing link whose target is a phantom note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BrokenLink {
    pub link_id: Uuid,
    pub target_note_id: Uuid,
    pub target_title: String,
}

/// A phantom note and how many links point at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RedLinkNote {
    pub id: Uuid,
    pub title: String,
    pub incoming_links_count: i64,
}
