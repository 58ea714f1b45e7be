//! Link graph endpoints under `/api/links`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use notegraph_core::defaults::{RELATED_LIMIT, RELATED_LIMIT_MAX, RELATED_THRESHOLD};
use notegraph_core::{
    BacklinksOptions, NewLinkRequest, OutgoingLinksOptions, RelatedNotesOptions,
    UpdateLinkRequest,
};
use notegraph_links::preview;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OutgoingQuery {
    pub limit: Option<i64>,
    pub include_context: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BacklinksQuery {
    pub limit: Option<i64>,
    pub include_context: Option<bool>,
    pub exclude_archived: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<usize>,
    pub threshold: Option<f64>,
    pub exclude_linked: Option<bool>,
}

impl RelatedQuery {
    /// Zero or missing limit means the default; larger limits are capped.
    fn into_options(self) -> RelatedNotesOptions {
        let limit = match self.limit {
            None | Some(0) => RELATED_LIMIT,
            Some(n) => n.min(RELATED_LIMIT_MAX),
        };
        RelatedNotesOptions {
            limit,
            threshold: self.threshold.unwrap_or(RELATED_THRESHOLD),
            exclude_linked: self.exclude_linked.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    #[serde(default)]
    pub content: String,
}

pub async fn create_link(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let link = state.service.create_link(body).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn outgoing_links(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OutgoingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = OutgoingLinksOptions::default();
    let options = OutgoingLinksOptions {
        limit: query.limit.unwrap_or(defaults.limit),
        include_context: query.include_context.unwrap_or(defaults.include_context),
    };
    let links = state.service.outgoing(note_id, options).await?;
    Ok(Json(links))
}

pub async fn backlinks(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<BacklinksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = BacklinksOptions::default();
    let options = BacklinksOptions {
        limit: query.limit.unwrap_or(defaults.limit),
        include_context: query.include_context.unwrap_or(defaults.include_context),
        exclude_archived: query.exclude_archived.unwrap_or(defaults.exclude_archived),
    };
    let links = state.service.backlinks(note_id, options).await?;
    Ok(Json(links))
}

pub async fn update_link(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let link = state.service.update_link(id, body).await?;
    Ok(Json(link))
}

pub async fn delete_link(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_link(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn related_notes(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<RelatedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let related = state.service.related(note_id, query.into_options()).await?;
    Ok(Json(related))
}

pub async fn broken_links(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let broken = state.service.broken_links(note_id).await?;
    Ok(Json(broken))
}

pub async fn red_link_notes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let notes = state.service.red_link_notes().await?;
    Ok(Json(notes))
}

pub async fn preview_links(ApiJson(body): ApiJson<PreviewBody>) -> impl IntoResponse {
    Json(preview(&body.content))
}
