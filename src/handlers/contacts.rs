use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::utils::{created, deleted, json_body, parse_id, updated};
use crate::api::format::project_many;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `view=full` returns stored records instead of the public projection
    pub view: Option<String>,
}

/// GET /contacts - all contacts, projected to id and names
pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Result<Response, ApiError> {
    let contacts = state.contacts.list_contacts().await?;
    match query.view.as_deref() {
        Some("full") => Ok(Json(contacts).into_response()),
        _ => Ok(Json(project_many(&contacts)).into_response()),
    }
}

/// POST /contact - create a contact
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    let id = state.contacts.create_contact(&payload).await?;
    Ok(created(format!("/contact/{}", id)))
}

/// GET /contact/:id - full contact record
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let contact = state.contacts.get_contact(id).await?;
    Ok(Json(contact).into_response())
}

/// PUT /contact/:id - update, keeping stored values for omitted fields
pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let payload = json_body(payload)?;
    state.contacts.update_contact(id, &payload).await?;
    Ok(updated())
}

/// DELETE /contact/:id - remove the contact and everything it owns
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    state.contacts.delete_contact(id).await?;
    Ok(deleted())
}
