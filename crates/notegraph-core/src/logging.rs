//! Structured logging schema and field name constants for notegraph.
//!
//! All crates use these names for structured logging fields so log
//! aggregation can query by the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points (phantom creation, duplicate skip) |
//! | TRACE | Per-item iteration (per-candidate scores, per-link resolution) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP layer.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "links", "database"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "sync", "related", "broken_links", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "sync", "get_related", "find_broken_links", "create_link"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Link UUID being operated on.
pub const LINK_ID: &str = "link_id";

/// Wiki-link target title being resolved.
pub const TARGET_TITLE: &str = "target_title";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of wiki-links extracted from content.
pub const EXTRACTED_COUNT: &str = "extracted_count";

/// Number of links persisted by a sync.
pub const CREATED_COUNT: &str = "created_count";

/// Number of duplicate links skipped by a sync.
pub const SKIPPED_COUNT: &str = "skipped_count";

/// Number of phantom notes created by a sync.
pub const PHANTOM_COUNT: &str = "phantom_count";

/// Number of candidate notes scored.
pub const CANDIDATE_COUNT: &str = "candidate_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
