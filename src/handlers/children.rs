use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::utils::{created, deleted, json_body, parse_id, updated};
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::ChildKind;

fn parse_kind(raw: &str) -> Result<ChildKind, ApiError> {
    Ok(raw.parse::<ChildKind>()?)
}

/// GET /contact/:id/:kind - every row of one collection for a contact
pub async fn list(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let rows = state.contacts.list_children(id, kind).await?;
    Ok(Json(rows).into_response())
}

/// POST /contact/:id/:kind
pub async fn create(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let payload = json_body(payload)?;
    let child_id = state.contacts.create_child(id, kind, &payload).await?;
    Ok(created(format!("/contact/{}/{}/{}", id, kind.path_segment(), child_id)))
}

/// GET /contact/:id/:kind/:child_id
pub async fn get(
    State(state): State<AppState>,
    Path((id, kind, child_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let (id, child_id) = (parse_id(&id)?, parse_id(&child_id)?);
    let row = state.contacts.get_child(id, kind, child_id).await?;
    Ok(Json(row).into_response())
}

/// PUT /contact/:id/:kind/:child_id - full replace of the writable fields
pub async fn put(
    State(state): State<AppState>,
    Path((id, kind, child_id)): Path<(String, String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let (id, child_id) = (parse_id(&id)?, parse_id(&child_id)?);
    let payload = json_body(payload)?;
    state.contacts.update_child(id, kind, child_id, &payload).await?;
    Ok(updated())
}

/// DELETE /contact/:id/:kind/:child_id
pub async fn delete(
    State(state): State<AppState>,
    Path((id, kind, child_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let (id, child_id) = (parse_id(&id)?, parse_id(&child_id)?);
    state.contacts.delete_child(id, kind, child_id).await?;
    Ok(deleted())
}
