//! Centralized default constants for notegraph.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// LINK EXTRACTION
// =============================================================================

/// Characters of surrounding text captured on each side of a wiki-link.
pub const LINK_CONTEXT_CHARS: usize = 50;

// =============================================================================
// RELATED-NOTES SCORING
// =============================================================================

/// Score added per tag shared between the note and a candidate.
pub const WEIGHT_COMMON_TAG: f64 = 3.0;

/// Score added when links exist in both directions.
pub const WEIGHT_BIDIRECTIONAL_LINK: f64 = 5.0;

/// Score added when a link exists in exactly one direction.
pub const WEIGHT_UNIDIRECTIONAL_LINK: f64 = 2.5;

/// Score added when both notes sit in the same (non-null) folder.
pub const WEIGHT_SAME_FOLDER: f64 = 1.0;

/// Score added per keyword shared between the note and a candidate.
pub const WEIGHT_COMMON_KEYWORD: f64 = 0.5;

/// Default number of related notes returned.
pub const RELATED_LIMIT: usize = 10;

/// Upper bound on related notes accepted from HTTP callers.
pub const RELATED_LIMIT_MAX: usize = 100;

/// Default minimum score for a related note to be returned.
pub const RELATED_THRESHOLD: f64 = 1.0;

// =============================================================================
// LINK LISTINGS
// =============================================================================

/// Default page size for a note's outgoing links.
pub const OUTGOING_LIMIT: i64 = 100;

/// Maximum page size for a note's outgoing links.
pub const OUTGOING_LIMIT_MAX: i64 = 1000;

/// Default page size for a note's backlinks.
pub const BACKLINK_LIMIT: i64 = 50;

/// Maximum page size for a note's backlinks.
pub const BACKLINK_LIMIT_MAX: i64 = 500;
