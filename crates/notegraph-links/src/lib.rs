//! # notegraph-links
//!
//! The note-linking subsystem of notegraph.
//!
//! This crate provides:
//! - Link synchronization: a note's outgoing links rebuilt from its wiki-links,
//!   with phantom notes created for unresolved titles
//! - Related-note scoring over tags, links, folders, and keywords
//! - Broken-link and red-link detection
//! - [`LinkService`], the facade request handlers call
//! - [`InMemoryStore`], a store for tests and embedded use
//!
//! ## Example
//!
//! ```ignore
//! use notegraph_db::Database;
//! use notegraph_links::{CreateNoteRequest, LinkService};
//!
//! let db = Database::connect("postgres://...").await?;
//! let service = LinkService::new(db.store());
//!
//! let saved = service
//!     .create_note(CreateNoteRequest {
//!         title: "Index".into(),
//!         content: "See [[Graph Theory]] and [[Euler|Leonhard Euler]]".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! let broken = service.broken_links(saved.note.id).await?;
//! ```

pub mod broken;
pub mod locks;
pub mod memory;
pub mod related;
pub mod service;
pub mod sync;

// Re-export core types
pub use notegraph_core::*;

pub use broken::BrokenLinkDetector;
pub use locks::NoteLocks;
pub use memory::{InMemoryStore, StoreOp};
pub use related::{note_keywords, score_candidate, RelatedNotesScorer, ScoringContext};
pub use service::{clamp_limit, preview, LinkService, SavedNote};
pub use sync::{resolve_or_create_target, LinkSynchronizer, ResolvedTarget};
