//! Folders and tags: the note attributes related-note scoring reads.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiJson, ApiPath};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NameBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TagNoteBody {
    pub tag_id: Uuid,
}

pub async fn create_folder(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Folder name cannot be empty".to_string()));
    }
    let folder = state.service.store().folders.create(name).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn list_folders(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let folders = state.service.store().folders.list().await?;
    Ok(Json(folders))
}

pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Tag name cannot be empty".to_string()));
    }
    let tag = state.service.store().tags.create(name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.service.store().tags.list().await?;
    Ok(Json(tags))
}

pub async fn list_note_tags(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Surfaces NoteNotFound
    state.service.get_note(note_id).await?;
    let tag_ids = state.service.store().tags.get_for_note(note_id).await?;
    Ok(Json(tag_ids))
}

pub async fn tag_note(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<TagNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .store()
        .tags
        .add_to_note(note_id, body.tag_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn untag_note(
    State(state): State<AppState>,
    ApiPath((note_id, tag_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .store()
        .tags
        .remove_from_note(note_id, tag_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
