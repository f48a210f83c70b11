use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Contacts API",
        "version": version,
        "description": "CRUD API for contacts and their addresses, phones and emails",
        "endpoints": {
            "contacts": "GET /contacts[?view=full]",
            "contact": "POST /contact, GET|PUT|DELETE /contact/:id",
            "address": "GET|POST /contact/:id/address, GET|PUT|DELETE /contact/:id/address/:address_id",
            "phone": "GET|POST /contact/:id/phone, GET|PUT|DELETE /contact/:id/phone/:phone_id",
            "email": "GET|POST /contact/:id/email, GET|PUT|DELETE /contact/:id/email/:email_id",
            "health": "GET /health",
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.contacts.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                })),
            )
        }
    }
}
