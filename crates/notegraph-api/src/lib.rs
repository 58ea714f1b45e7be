//! notegraph-api - HTTP API for notegraph.
//!
//! Thin axum layer over [`LinkService`]. The binary in `main.rs` wires it to
//! PostgreSQL; tests drive [`create_router`] against the in-memory store.

pub mod config;
pub mod error;
pub mod handlers;

use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use notegraph_core::new_v7;
use notegraph_links::LinkService;

pub use config::{ApiConfig, LogFormat};
pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: LinkService,
}

impl AppState {
    pub fn new(service: LinkService) -> Self {
        Self { service }
    }
}

/// OpenAPI component schemas, served at `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "notegraph API",
        description = "Notes connected by wiki-links, with backlinks, related notes, and red-link detection"
    ),
    components(schemas(
        notegraph_core::Note,
        notegraph_core::NoteSummary,
        notegraph_core::CreateNoteRequest,
        notegraph_core::NoteLink,
        notegraph_core::LinkedNote,
        notegraph_core::NewLinkRequest,
        notegraph_core::UpdateLinkRequest,
        notegraph_core::ParsedLink,
        notegraph_core::LinkPreview,
        notegraph_core::SyncReport,
        notegraph_core::LinkRelation,
        notegraph_core::RelationReasons,
        notegraph_core::RelatedNote,
        notegraph_core::BrokenLink,
        notegraph_core::RedLinkNote,
        notegraph_core::Tag,
        notegraph_core::Folder,
        handlers::notes::SavedNoteResponse,
    )),
    tags(
        (name = "Notes", description = "Note CRUD; saving content re-syncs links"),
        (name = "Links", description = "Outgoing links, backlinks, related notes, broken links"),
        (name = "Organize", description = "Folders and tags"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

/// Time-ordered request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = new_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the full router with tracing and request-id layers.
pub fn create_router(state: AppState) -> Router {
    use handlers::{links, notes, organize};

    Router::new()
        .route("/health", get(health_check))
        .route("/api/openapi.json", get(openapi_json))
        // Notes
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route(
            "/api/notes/:id/tags",
            get(organize::list_note_tags).post(organize::tag_note),
        )
        .route("/api/notes/:id/tags/:tag_id", delete(organize::untag_note))
        // Links
        .route("/api/links", post(links::create_link))
        .route("/api/links/preview", post(links::preview_links))
        .route("/api/links/red-links", get(links::red_link_notes))
        .route("/api/links/backlinks/:note_id", get(links::backlinks))
        .route("/api/links/related/:note_id", get(links::related_notes))
        .route("/api/links/broken/:note_id", get(links::broken_links))
        .route(
            "/api/links/:id",
            get(links::outgoing_links)
                .put(links::update_link)
                .delete(links::delete_link),
        )
        // Organize
        .route(
            "/api/folders",
            get(organize::list_folders).post(organize::create_folder),
        )
        .route("/api/tags", get(organize::list_tags).post(organize::create_tag))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
