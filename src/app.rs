use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment, SecurityConfig};
use crate::database::EntityStore;
use crate::handlers::{children, contacts, public};
use crate::services::ContactService;
use crate::validation::RulesTable;

/// Request-scoped handlers share only this: the store handle and the read-only rules
#[derive(Clone)]
pub struct AppState {
    pub contacts: ContactService,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, rules: Arc<RulesTable>) -> Self {
        Self {
            contacts: ContactService::new(store, rules),
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(contact_routes())
        .merge(child_routes())
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security, config.environment))
        .layer(TraceLayer::new_for_http())
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(contacts::list))
        .route("/contact", post(contacts::create))
        .route(
            "/contact/:id",
            get(contacts::get).put(contacts::put).delete(contacts::delete),
        )
}

fn child_routes() -> Router<AppState> {
    Router::new()
        // :kind is one of address, phone, email; anything else is a 404
        .route("/contact/:id/:kind", get(children::list).post(children::create))
        .route(
            "/contact/:id/:kind/:child_id",
            get(children::get).put(children::put).delete(children::delete),
        )
}

fn cors_layer(security: &SecurityConfig, environment: Environment) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}
