//! # notegraph-core
//!
//! Core types, traits, and text scanning for the notegraph knowledge base.
//!
//! This crate provides the data model shared by the other notegraph crates,
//! the repository traits that storage backends implement, and the two pure
//! text scanners the linking subsystem is built on:
//!
//! - [`extract_links`] finds `[[Target]]` / `[[Target|Display]]` wiki-links
//! - [`extract_keywords`] normalizes text into a keyword set for scoring

pub mod defaults;
pub mod error;
pub mod keywords;
pub mod link_parser;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use keywords::extract_keywords;
pub use link_parser::{extract_links, strip_html};
pub use models::*;
pub use traits::*;

/// Generate a new time-ordered UUIDv7 identifier.
///
/// Ids sort by creation time, which the related-notes ranking relies on for
/// its deterministic tie-break.
#[inline]
pub fn new_v7() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}
