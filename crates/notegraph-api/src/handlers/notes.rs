//! Note CRUD. Saving content re-syncs the note's outgoing links.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notegraph_core::{CreateNoteRequest, ListNotesRequest, Note, SyncReport, UpdateNoteRequest};
use notegraph_links::SavedNote;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::error::ApiError;
use crate::AppState;

/// A saved note and the link sync its save triggered.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SavedNoteResponse {
    pub note: Note,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncReport>,
}

impl From<SavedNote> for SavedNoteResponse {
    fn from(saved: SavedNote) -> Self {
        Self {
            note: saved.note,
            sync: saved.sync,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    #[serde(default)]
    pub exclude_archived: bool,
    #[serde(default)]
    pub phantom_only: bool,
}

pub async fn list_notes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state
        .service
        .list_notes(ListNotesRequest {
            exclude_id: None,
            exclude_archived: query.exclude_archived,
            phantom_only: query.phantom_only,
        })
        .await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.service.create_note(body).await?;
    Ok((StatusCode::CREATED, Json(SavedNoteResponse::from(saved))))
}

pub async fn get_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.service.get_note(id).await?;
    Ok(Json(note))
}

pub async fn update_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.service.update_note(id, body).await?;
    Ok(Json(SavedNoteResponse::from(saved)))
}

pub async fn delete_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_note(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
