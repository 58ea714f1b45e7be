//! Wiki-link extraction from note content.
//!
//! Supported forms:
//! - `[[Note Title]]`
//! - `[[Note Title|Display Text]]`
//!
//! The target may contain neither `]` nor `|`; the display text may not
//! contain `]`. Matches are found left to right and never overlap. Nested
//! brackets are not supported and unbalanced `[[` is left as literal text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::LINK_CONTEXT_CHARS;
use crate::models::ParsedLink;

static WIKILINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("wikilink regex")
});

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Extract every wiki-link from `content`, in order of appearance.
///
/// Never fails: content without link syntax yields an empty vector. The
/// same target appearing twice yields two entries.
///
/// # Examples
///
/// ```
/// use notegraph_core::extract_links;
///
/// let links = extract_links("a [[X]] b [[Y|Z]] c");
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].target_title, "X");
/// assert_eq!(links[1].display_text.as_deref(), Some("Z"));
/// ```
pub fn extract_links(content: &str) -> Vec<ParsedLink> {
    if !content.contains("[[") {
        return Vec::new();
    }

    let offsets = CharOffsets::new(content);

    WIKILINK_REGEX
        .captures_iter(content)
        .filter_map(|cap| {
            let full = cap.get(0)?;
            let target_title = cap.get(1)?.as_str().trim().to_string();
            let display_text = cap
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let start_index = offsets.char_index(full.start());
            let end_index = offsets.char_index(full.end());

            let context_start = start_index.saturating_sub(LINK_CONTEXT_CHARS);
            let context_end = (end_index + LINK_CONTEXT_CHARS).min(offsets.char_len());
            let context = content
                [offsets.byte_index(context_start)..offsets.byte_index(context_end)]
                .trim()
                .to_string();

            Some(ParsedLink {
                full_text: full.as_str().to_string(),
                target_title,
                display_text,
                context,
                start_index,
                end_index,
            })
        })
        .collect()
}

/// Strip markup tags and collapse whitespace.
///
/// Every `<...>` span is replaced with a space, whitespace runs become a
/// single space, and the result is trimmed.
pub fn strip_html(html: &str) -> String {
    let stripped = TAG_REGEX.replace_all(html, " ");
    WHITESPACE_REGEX
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Byte offset of every character boundary in a string, plus its length.
struct CharOffsets {
    boundaries: Vec<usize>,
}

impl CharOffsets {
    fn new(content: &str) -> Self {
        let mut boundaries: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();
        boundaries.push(content.len());
        Self { boundaries }
    }

    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Character index of a byte offset that lies on a char boundary.
    fn char_index(&self, byte: usize) -> usize {
        self.boundaries
            .binary_search(&byte)
            .unwrap_or_else(|insert_at| insert_at)
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.boundaries[char_idx.min(self.char_len())]
    }
}
