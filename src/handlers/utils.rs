use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;

/// Path ids are positive integers; anything else cannot name a row
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::not_found(format!("id '{}'", raw))),
    }
}

/// Unwrap a JSON body, turning extractor rejections into a plain 400
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

/// 201 with a Location header for the new resource
pub fn created(location: String) -> Response {
    (StatusCode::CREATED, [(header::LOCATION, location)], "Created").into_response()
}

pub fn updated() -> Response {
    (StatusCode::OK, "Updated").into_response()
}

pub fn deleted() -> Response {
    (StatusCode::OK, "Deleted").into_response()
}
